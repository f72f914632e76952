//! Resilient HTTP access to the CyberNuwa backend.
//!
//! [`ApiClient`] wraps every call in a response cache, a per-request
//! timeout, optional retry with capped exponential backoff, and a fallback
//! to canned [`MockDataProvider`] data when the backend is unreachable.

pub mod cache;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod mock;
pub mod request;
pub mod retry;

pub use cache::{CacheStats, EvictionCause, EvictionListener, MemoryCache};
pub use client::{build_client, ApiClient, ApiClientBuilder, HttpConfig};
pub use endpoints::{
    AgentsApi, BuildAgent, ListQuery, ModulesApi, SignatureLog, SignaturesApi, SubmitModule, SubmitWish,
    SynthesizeTask, TasksApi, WishesApi,
};
pub use error::{ApiError, ErrorKind};
pub use mock::{MockDataProvider, MOCK_MESSAGE};
pub use request::{fingerprint, Method, RequestBuilder, RequestOptions};
pub use retry::RetryPolicy;

pub use nuwa_common_async::CancellationToken;
