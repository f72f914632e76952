//! Entities returned by the community platform backend.
//!
//! Fields are lenient: the backend and the showcase endpoints disagree on
//! naming (`created_at` vs `createdAt`) and on whether text is localized, so
//! every optional field defaults and unknown fields are preserved in `extra`.

use crate::lang::{Language, LocalizedText};
use crate::status::{AgentStatus, TaskStatus, WishStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A wish posted by a community member.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Wish {
    pub id: u64,
    #[serde(default)]
    pub title: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    #[serde(default, skip_serializing_if = "LocalizedText::is_empty")]
    pub author: LocalizedText,
    /// Raw submission text (backend wishes carry this instead of a title).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub views: u64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<Language, Vec<String>>,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Language the localized fields were last translated into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Wish {
    /// Parsed status, if it is a known value.
    pub fn status(&self) -> Option<WishStatus> {
        WishStatus::parse(&self.status)
    }

    /// Title text in the preferred language, falling back to `content`.
    pub fn display_title(&self, lang: Language) -> Option<&str> {
        self.title
            .best(lang)
            .map(|(_, s)| s)
            .or(self.content.as_deref())
    }
}

/// A trained agent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Agent {
    pub id: u64,
    #[serde(default)]
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<u32>,
    #[serde(default, alias = "tasksCompleted", skip_serializing_if = "Option::is_none")]
    pub tasks_completed: Option<u64>,
    #[serde(default, alias = "lastActive", skip_serializing_if = "Option::is_none")]
    pub last_active: Option<String>,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Agent {
    /// Parsed status, if it is a known value.
    pub fn status(&self) -> Option<AgentStatus> {
        AgentStatus::parse(&self.status)
    }
}

/// A task synthesized from a wish.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wish_id: Option<u64>,
    #[serde(default)]
    pub title: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<u32>,
    #[serde(default)]
    pub status: String,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    /// Parsed status, if it is a known value.
    pub fn status(&self) -> Option<TaskStatus> {
        TaskStatus::parse(&self.status)
    }
}

/// A module contributed towards a task.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Module {
    pub id: u64,
    pub task_id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "contributor", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A contribution signature recorded against an agent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Signature {
    pub id: u64,
    pub agent_id: u64,
    pub user_id: String,
    pub contribution: String,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
