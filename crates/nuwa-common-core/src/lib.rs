//! CyberNuwa common core types and utilities.

pub mod envelope;
pub mod error;
pub mod lang;
pub mod models;
pub mod status;
pub mod timestamp;

pub use envelope::{ApiResponse, Page, Pagination, ResponseOrigin};
pub use error::{Error, Result};
pub use lang::{Language, LocalizedText};
pub use models::{Agent, Module, Signature, Task, Wish};
pub use status::{AgentStatus, ModuleStatus, TaskStatus, WishStatus};
pub use timestamp::Timestamp;
