//! API client errors.

use nuwa_common_async::{Cancelled, TimeoutError};
use std::sync::Arc;
use std::time::Duration;

/// Errors surfaced by [`ApiClient`](crate::ApiClient).
///
/// Cloneable so a single network failure can be handed to every caller
/// waiting on the same in-flight request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("Request timeout after {}ms", after.as_millis())]
    Timeout { after: Duration },

    #[error("network error: {0}")]
    Network(#[source] Arc<reqwest::Error>),

    #[error("HTTP error! status: {status}")]
    Http { status: u16, body: String },

    #[error("failed to parse response: {0}")]
    Parse(#[source] Arc<serde_json::Error>),

    #[error("request cancelled")]
    Cancelled,

    /// The backend answered with `success: false` and no usable payload.
    #[error("backend reported failure: {reason}")]
    Rejected { reason: String },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] Arc<reqwest::Error>),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Coarse classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Timeout,
    Network,
    Http,
    Parse,
    Cancelled,
    Rejected,
    Config,
}

impl ApiError {
    /// Kind of failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Network(_) => ErrorKind::Network,
            Self::Http { .. } => ErrorKind::Http,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Rejected { .. } => ErrorKind::Rejected,
            Self::ClientBuild(_) | Self::InvalidRequest(_) => ErrorKind::Config,
        }
    }

    /// HTTP status, for [`ApiError::Http`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Timeout | ErrorKind::Network | ErrorKind::Http | ErrorKind::Parse
        )
    }

    pub(crate) fn parse(e: serde_json::Error) -> Self {
        Self::Parse(Arc::new(e))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(Arc::new(e))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::parse(e)
    }
}

impl From<TimeoutError> for ApiError {
    fn from(e: TimeoutError) -> Self {
        Self::Timeout { after: e.after }
    }
}

impl From<Cancelled> for ApiError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}
