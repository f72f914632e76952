//! Typed wrappers over the backend's list and submit endpoints.
//!
//! List calls go through [`ApiClient::request_with_retry`] and may be served
//! from cache or mock data. Submit calls are sent once and never cached.

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::request::RequestOptions;
use nuwa_common_core::{Agent, ApiResponse, Module, Page, Signature, Task, Wish};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Endpoint paths.
pub mod paths {
    pub const LIST_WISHES: &str = "/api/wishes/list_wishes";
    pub const SUBMIT_WISH: &str = "/api/wishes/submit_wish";
    pub const LIST_TASKS: &str = "/api/tasks/list_tasks";
    pub const SYNTHESIZE_TASK: &str = "/api/tasks/synthesize_task";
    pub const LIST_MODULES: &str = "/api/modules/list_modules";
    pub const SUBMIT_MODULE: &str = "/api/modules/submit_module";
    pub const LIST_AGENTS: &str = "/api/agents/list_agents";
    pub const BUILD_AGENT: &str = "/api/agents/build_agent";
    pub const LIST_SIGNATURES: &str = "/api/signatures/list_signatures";
    pub const SIGNATURE_LOG: &str = "/api/signatures/signature_log";
}

/// Pagination and filters for list endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub size: u32,
    pub status: Option<String>,
    pub wish_id: Option<u64>,
    pub task_id: Option<u64>,
    pub agent_id: Option<u64>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: 10,
            status: None,
            wish_id: None,
            task_id: None,
            agent_id: None,
        }
    }
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = size.max(1);
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn wish_id(mut self, id: u64) -> Self {
        self.wish_id = Some(id);
        self
    }

    pub fn task_id(mut self, id: u64) -> Self {
        self.task_id = Some(id);
        self
    }

    pub fn agent_id(mut self, id: u64) -> Self {
        self.agent_id = Some(id);
        self
    }

    /// Encoded query string, without the leading `?`.
    pub fn to_query_string(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair("page", &self.page.to_string());
        query.append_pair("size", &self.size.to_string());
        if let Some(status) = &self.status {
            query.append_pair("status", status);
        }
        if let Some(id) = self.wish_id {
            query.append_pair("wish_id", &id.to_string());
        }
        if let Some(id) = self.task_id {
            query.append_pair("task_id", &id.to_string());
        }
        if let Some(id) = self.agent_id {
            query.append_pair("agent_id", &id.to_string());
        }
        query.finish()
    }

    /// `endpoint?query`.
    pub fn apply(&self, endpoint: &str) -> String {
        format!("{endpoint}?{}", self.to_query_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitWish {
    pub content: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizeTask {
    pub wish_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitModule {
    pub task_id: u64,
    pub name: String,
    pub content: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildAgent {
    pub task_id: u64,
    pub modules: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureLog {
    pub agent_id: u64,
    pub user_id: String,
    pub contribution: String,
}

async fn list<T: DeserializeOwned>(
    client: &ApiClient,
    endpoint: &str,
    query: &ListQuery,
) -> Result<ApiResponse<Page<T>>, ApiError> {
    client
        .request_with_retry(&query.apply(endpoint), RequestOptions::get())
        .await
}

async fn submit<T: DeserializeOwned, B: Serialize>(
    client: &ApiClient,
    endpoint: &str,
    body: &B,
) -> Result<ApiResponse<T>, ApiError> {
    let body = serde_json::to_value(body)
        .map_err(|e| ApiError::InvalidRequest(format!("unserializable body: {e}")))?;
    client
        .request(endpoint, RequestOptions::post(body).no_cache())
        .await
}

macro_rules! endpoint_group {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            client: ApiClient,
        }

        impl $name {
            pub fn new(client: ApiClient) -> Self {
                Self { client }
            }
        }
    };
}

endpoint_group!(
    /// Wish endpoints.
    WishesApi
);
endpoint_group!(
    /// Task endpoints.
    TasksApi
);
endpoint_group!(
    /// Module endpoints.
    ModulesApi
);
endpoint_group!(
    /// Agent endpoints.
    AgentsApi
);
endpoint_group!(
    /// Signature endpoints.
    SignaturesApi
);

impl WishesApi {
    pub async fn list_wishes(&self, query: &ListQuery) -> Result<ApiResponse<Page<Wish>>, ApiError> {
        list(&self.client, paths::LIST_WISHES, query).await
    }

    pub async fn submit_wish(&self, body: &SubmitWish) -> Result<ApiResponse<Wish>, ApiError> {
        submit(&self.client, paths::SUBMIT_WISH, body).await
    }
}

impl TasksApi {
    pub async fn list_tasks(&self, query: &ListQuery) -> Result<ApiResponse<Page<Task>>, ApiError> {
        list(&self.client, paths::LIST_TASKS, query).await
    }

    pub async fn synthesize_task(&self, body: &SynthesizeTask) -> Result<ApiResponse<Task>, ApiError> {
        submit(&self.client, paths::SYNTHESIZE_TASK, body).await
    }
}

impl ModulesApi {
    pub async fn list_modules(&self, query: &ListQuery) -> Result<ApiResponse<Page<Module>>, ApiError> {
        list(&self.client, paths::LIST_MODULES, query).await
    }

    pub async fn submit_module(&self, body: &SubmitModule) -> Result<ApiResponse<Module>, ApiError> {
        submit(&self.client, paths::SUBMIT_MODULE, body).await
    }
}

impl AgentsApi {
    pub async fn list_agents(&self, query: &ListQuery) -> Result<ApiResponse<Page<Agent>>, ApiError> {
        list(&self.client, paths::LIST_AGENTS, query).await
    }

    pub async fn build_agent(&self, body: &BuildAgent) -> Result<ApiResponse<Agent>, ApiError> {
        submit(&self.client, paths::BUILD_AGENT, body).await
    }
}

impl SignaturesApi {
    pub async fn list_signatures(&self, query: &ListQuery) -> Result<ApiResponse<Page<Signature>>, ApiError> {
        list(&self.client, paths::LIST_SIGNATURES, query).await
    }

    pub async fn signature_log(&self, body: &SignatureLog) -> Result<ApiResponse<Signature>, ApiError> {
        submit(&self.client, paths::SIGNATURE_LOG, body).await
    }
}
