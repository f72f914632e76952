//! Canned responses served when the backend is unreachable.

use nuwa_common_core::ApiResponse;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::request::strip_query;

/// Message carried by every canned response.
pub const MOCK_MESSAGE: &str = "Mock data loaded successfully";

/// Read-only table of endpoint path to canned success envelope.
///
/// Lookups ignore the query string, so paginated requests fall back to the
/// same canned page.
#[derive(Debug, Clone, Default)]
pub struct MockDataProvider {
    entries: HashMap<String, ApiResponse<Value>>,
}

impl MockDataProvider {
    /// Provider with no entries; every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Provider with the demo data for the list endpoints the UI renders offline.
    pub fn builtin() -> Self {
        Self::empty()
            .with_entry("/api/wishes/list_wishes", builtin_wishes())
            .with_entry("/api/agents/list_agents", builtin_agents())
            .with_entry("/api/tasks/list_tasks", builtin_tasks())
    }

    /// Add a success envelope around `data` for an endpoint path.
    pub fn with_entry(self, endpoint: impl AsRef<str>, data: Value) -> Self {
        self.with_response(endpoint, ApiResponse::ok(data, MOCK_MESSAGE))
    }

    /// Add a full envelope for an endpoint path.
    pub fn with_response(mut self, endpoint: impl AsRef<str>, response: ApiResponse<Value>) -> Self {
        self.entries
            .insert(strip_query(endpoint.as_ref()).to_string(), response);
        self
    }

    /// Canned response for an endpoint, if any.
    pub fn get(&self, endpoint: &str) -> Option<ApiResponse<Value>> {
        self.entries.get(strip_query(endpoint)).cloned()
    }

    /// Whether a canned response exists for an endpoint.
    pub fn contains(&self, endpoint: &str) -> bool {
        self.entries.contains_key(strip_query(endpoint))
    }

    /// Endpoint paths with canned responses, sorted.
    pub fn endpoints(&self) -> Vec<&str> {
        let mut endpoints: Vec<_> = self.entries.keys().map(String::as_str).collect();
        endpoints.sort_unstable();
        endpoints
    }

    /// Number of canned endpoints.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no endpoint has canned data.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn builtin_wishes() -> Value {
    json!({
        "items": [
            {
                "id": 1,
                "title": {"zh": "咖啡智能助手", "en": "Coffee Assistant"},
                "description": {"zh": "帮助制作完美咖啡", "en": "Help make perfect coffee"},
                "author": {"zh": "咖啡爱好者", "en": "Coffee Lover"},
                "status": "pending",
                "likes": 23,
                "comments": 8,
                "views": 1567,
                "tags": {"zh": ["咖啡", "智能助手", "生活"], "en": ["coffee", "assistant", "life"]},
                "createdAt": "2025-01-15"
            },
            {
                "id": 2,
                "title": {"zh": "动漫推荐系统", "en": "Anime Recommendation System"},
                "description": {"zh": "基于用户喜好的动漫推荐", "en": "Anime recommendations based on user preferences"},
                "author": {"zh": "动漫迷", "en": "Anime Fan"},
                "status": "processing",
                "likes": 45,
                "comments": 12,
                "views": 2341,
                "tags": {"zh": ["动漫", "推荐", "AI"], "en": ["anime", "recommendation", "AI"]},
                "createdAt": "2025-01-14"
            }
        ],
        "total": 2,
        "page": 1,
        "size": 10,
        "pages": 1
    })
}

fn builtin_agents() -> Value {
    json!({
        "items": [
            {
                "id": 1,
                "name": {"zh": "咖啡助手", "en": "Coffee Assistant"},
                "description": {"zh": "专业的咖啡制作指导", "en": "Professional coffee making guidance"},
                "status": "active",
                "performance": 95,
                "tasksCompleted": 150,
                "lastActive": "2025-01-15T10:30:00Z"
            }
        ],
        "total": 1,
        "page": 1,
        "size": 10,
        "pages": 1
    })
}

fn builtin_tasks() -> Value {
    json!({
        "items": [
            {
                "id": 1,
                "wish_id": 1,
                "title": {"zh": "咖啡配方推荐模块", "en": "Coffee Recipe Module"},
                "description": {"zh": "根据口味推荐咖啡配方", "en": "Recommend coffee recipes by taste"},
                "modules": ["recipe_search", "taste_profile"],
                "difficulty": "medium",
                "estimated_time": 4,
                "status": "open",
                "created_at": "2025-01-15T09:00:00Z"
            }
        ],
        "total": 1,
        "page": 1,
        "size": 10,
        "pages": 1
    })
}
