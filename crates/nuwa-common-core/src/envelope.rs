//! The JSON response envelope shared by every backend endpoint.

use crate::timestamp::Timestamp;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pagination block attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub size: u32,
    /// Total number of items across all pages.
    pub total: u64,
    /// Total number of pages.
    pub pages: u32,
}

/// Paginated list payload as returned in `data` by list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    /// Total number of items across all pages.
    #[serde(default)]
    pub total: u64,
    /// 1-based page number.
    #[serde(default = "first_page")]
    pub page: u32,
    /// Page size.
    #[serde(default)]
    pub size: u32,
    /// Total number of pages.
    #[serde(default)]
    pub pages: u32,
}

fn first_page() -> u32 {
    1
}

impl<T> Page<T> {
    /// Pagination block describing this page.
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            size: self.size,
            total: self.total,
            pages: self.pages,
        }
    }

    /// True when the page holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            size: 0,
            pages: 0,
        }
    }
}

/// Where a response was served from. Never part of the wire format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ResponseOrigin {
    /// Fresh from the backend.
    #[default]
    Network,
    /// Replayed from the response cache.
    Cache,
    /// Canned demo data standing in for a failed request.
    Mock,
}

/// Response envelope: `{success, data, message, error?, timestamp, pagination?}`.
///
/// `timestamp` is always the client-side time the response was served, never
/// the server's value. `error` is only meaningful when `success` is false, and
/// `data` must not be relied on in that case; a failure envelope without
/// `data` decodes with the payload's default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the backend reported success.
    pub success: bool,
    /// Response payload.
    #[serde(default)]
    pub data: T,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Error detail, present only when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Client-side receipt time.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Timestamp,
    /// Pagination block for list endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    /// Where this response came from.
    #[serde(skip)]
    pub origin: ResponseOrigin,
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .and_then(Timestamp::parse)
        .unwrap_or_else(Timestamp::now))
}

impl<T> ApiResponse<T> {
    /// Successful envelope.
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
            error: None,
            timestamp: Timestamp::now(),
            pagination: None,
            origin: ResponseOrigin::Network,
        }
    }

    /// Failed envelope carrying an error detail.
    pub fn failure(data: T, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data,
            message: message.into(),
            error: Some(error.into()),
            timestamp: Timestamp::now(),
            pagination: None,
            origin: ResponseOrigin::Network,
        }
    }

    /// Attach a pagination block.
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Mark where this response was served from.
    pub fn with_origin(mut self, origin: ResponseOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Rewrite the timestamp to now and drop any `error` sent alongside `success=true`.
    pub fn stamped(mut self) -> Self {
        self.timestamp = Timestamp::now();
        if self.success {
            self.error = None;
        }
        self
    }

    /// Map the payload.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            success: self.success,
            data: f(self.data),
            message: self.message,
            error: self.error,
            timestamp: self.timestamp,
            pagination: self.pagination,
            origin: self.origin,
        }
    }

    /// Payload when the backend reported success, otherwise the error detail.
    pub fn into_result(self) -> Result<T, String> {
        if self.success {
            Ok(self.data)
        } else {
            Err(self
                .error
                .unwrap_or_else(|| self.message.clone()))
        }
    }
}

impl ApiResponse<Value> {
    /// Deserialize the untyped payload into `U`.
    pub fn into_typed<U: DeserializeOwned>(self) -> Result<ApiResponse<U>, serde_json::Error> {
        let data = serde_json::from_value(self.data)?;
        Ok(ApiResponse {
            success: self.success,
            data,
            message: self.message,
            error: self.error,
            timestamp: self.timestamp,
            pagination: self.pagination,
            origin: self.origin,
        })
    }
}
