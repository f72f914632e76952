//! Resilient API client: cache, timeout-bounded fetch, mock fallback, retry.

use crate::cache::{CacheStats, EvictionCause, EvictionListener, MemoryCache};
use crate::error::ApiError;
use crate::mock::MockDataProvider;
use crate::request::{fingerprint, RequestBuilder, RequestOptions};
use crate::retry::RetryPolicy;
use futures::future::{BoxFuture, FutureExt, Shared};
use nuwa_common_async::{check_cancelled, run_or_cancel, sleep_or_cancel, with_timeout, CancellationToken};
use nuwa_common_config::ApiConfig;
use nuwa_common_core::{ApiResponse, ResponseOrigin};
use nuwa_common_log::spans::{request_span, Timer};
use parking_lot::Mutex;
use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

type RawResponse = ApiResponse<Value>;
type FetchResult = Result<RawResponse, ApiError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

const HEALTH_ENDPOINT: &str = "/health";

/// HTTP transport configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
    /// Maximum idle connections per host.
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("nuwa/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 10,
        }
    }
}

/// Build a configured HTTP client.
///
/// No request timeout is set here; the API client bounds each call itself.
pub fn build_client(config: &HttpConfig) -> Result<Client, ApiError> {
    ClientBuilder::new()
        .connect_timeout(config.connect_timeout)
        .user_agent(&config.user_agent)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .build()
        .map_err(|e| ApiError::ClientBuild(Arc::new(e)))
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    config: ApiConfig,
    http: HttpConfig,
    mock: MockDataProvider,
    listener: Option<EvictionListener>,
}

impl ApiClientBuilder {
    /// Start from an API config, with the built-in mock data.
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            http: HttpConfig::default(),
            mock: MockDataProvider::builtin(),
            listener: None,
        }
    }

    /// Override transport settings.
    pub fn http_config(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Replace the mock data used for fallback.
    pub fn mock_data(mut self, mock: MockDataProvider) -> Self {
        self.mock = mock;
        self
    }

    /// Observe cache evictions.
    pub fn on_evict<F>(mut self, listener: F) -> Self
    where
        F: Fn(&str, EvictionCause) + Send + Sync + 'static,
    {
        self.listener = Some(Arc::new(listener));
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let base_url = self.config.base_url.trim_end_matches('/').to_string();
        url::Url::parse(&base_url)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid base URL '{base_url}': {e}")))?;

        let mut cache = MemoryCache::new(self.config.cache_capacity, self.config.cache_ttl());
        if let Some(listener) = self.listener {
            cache = cache.with_listener(listener);
        }

        Ok(ApiClient {
            inner: Arc::new(Inner {
                http: build_client(&self.http)?,
                requests: RequestBuilder::new().base_url(base_url).json_content(),
                retry: RetryPolicy::from_config(&self.config),
                config: self.config,
                cache,
                mock: self.mock,
                in_flight: Mutex::new(HashMap::new()),
                next_flight: AtomicU64::new(0),
            }),
        })
    }
}

struct Inner {
    config: ApiConfig,
    http: Client,
    requests: RequestBuilder,
    cache: MemoryCache<RawResponse>,
    mock: MockDataProvider,
    retry: RetryPolicy,
    in_flight: Mutex<HashMap<String, Flight>>,
    next_flight: AtomicU64,
}

/// A shared fetch and the number of callers still waiting on it.
struct Flight {
    id: u64,
    waiters: usize,
    fetch: SharedFetch,
}

impl Inner {
    /// One timeout-bounded network call, timed whatever the outcome.
    async fn send(&self, url: &str, options: &RequestOptions) -> FetchResult {
        let timer = Timer::start("api.send");
        let result = self.exchange(url, options).await;
        if let Err(e) = &result {
            tracing::debug!(url = %url, error = %e, "request failed");
        }
        timer.finish();
        result
    }

    /// The whole exchange, body included, must finish within the configured timeout.
    async fn exchange(&self, url: &str, options: &RequestOptions) -> FetchResult {
        let mut request = self
            .http
            .request(options.method.into(), url)
            .headers(self.requests.headers().clone());
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        let bytes = with_timeout(self.config.timeout(), async {
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ApiError::Http {
                    status: status.as_u16(),
                    body,
                });
            }
            Ok::<_, ApiError>(response.bytes().await?)
        })
        .await??;

        let parsed: RawResponse = serde_json::from_slice(&bytes)?;
        Ok(parsed.stamped())
    }

    /// Drop the in-flight entry for `key` if it still belongs to flight `id`.
    fn land(&self, key: &str, id: u64) {
        let mut in_flight = self.in_flight.lock();
        if in_flight.get(key).is_some_and(|flight| flight.id == id) {
            in_flight.remove(key);
        }
    }
}

/// One caller's stake in a shared fetch. When the last waiter goes away
/// before the fetch lands, the entry is dropped along with the request, so
/// the next caller starts afresh.
struct FlightGuard {
    inner: Arc<Inner>,
    key: String,
    id: u64,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        let abandoned = {
            let mut in_flight = self.inner.in_flight.lock();
            let remaining = match in_flight.get_mut(&self.key) {
                Some(flight) if flight.id == self.id => {
                    flight.waiters -= 1;
                    Some(flight.waiters)
                }
                _ => None,
            };
            if remaining == Some(0) {
                in_flight.remove(&self.key)
            } else {
                None
            }
        };
        if abandoned.is_some() {
            tracing::debug!(key = %self.key, "in-flight request abandoned");
        }
    }
}

/// Network leg plus cache population.
async fn fetch_and_store(inner: Arc<Inner>, key: String, url: String, options: RequestOptions) -> FetchResult {
    let response = inner.send(&url, &options).await?;
    if inner.config.enable_cache && options.cacheable {
        inner.cache.set(key, response.clone(), None);
    }
    Ok(response)
}

/// Join the in-flight fetch for `key`, or start one that others can join.
fn fetch_shared(
    inner: &Arc<Inner>,
    key: &str,
    url: String,
    options: RequestOptions,
) -> BoxFuture<'static, FetchResult> {
    let mut in_flight = inner.in_flight.lock();
    let (fetch, id) = match in_flight.get_mut(key) {
        Some(flight) => {
            tracing::debug!(key = %key, "joining in-flight request");
            flight.waiters += 1;
            (flight.fetch.clone(), flight.id)
        }
        None => {
            let id = inner.next_flight.fetch_add(1, Ordering::Relaxed);
            let owner = Arc::clone(inner);
            let owned_key = key.to_string();
            let fetch = async move {
                let result = fetch_and_store(Arc::clone(&owner), owned_key.clone(), url, options).await;
                owner.land(&owned_key, id);
                result
            }
            .boxed()
            .shared();

            in_flight.insert(
                key.to_string(),
                Flight {
                    id,
                    waiters: 1,
                    fetch: fetch.clone(),
                },
            );
            (fetch, id)
        }
    };
    drop(in_flight);

    let guard = FlightGuard {
        inner: Arc::clone(inner),
        key: key.to_string(),
        id,
    };
    async move {
        let result = fetch.await;
        drop(guard);
        result
    }
    .boxed()
}

/// Client for the CyberNuwa backend.
///
/// A call first consults the response cache, then performs a single
/// timeout-bounded request, and on failure serves canned mock data when
/// enabled and available. Successful network responses are cached; mock
/// responses never are. Cheap to clone; clones share cache and connections.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl ApiClient {
    /// Client with the built-in mock data.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        ApiClientBuilder::new(config).build()
    }

    /// Builder for injecting mock data, transport settings or an eviction listener.
    pub fn builder(config: ApiConfig) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }

    /// Active configuration.
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Full URL for an endpoint path.
    pub fn url(&self, endpoint: &str) -> String {
        self.inner.requests.url(endpoint)
    }

    /// Perform a request with cache lookup and mock fallback.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.request_cancellable(endpoint, options, &CancellationToken::new())
            .await
    }

    /// [`request`](Self::request) that stops early when `token` fires.
    pub async fn request_cancellable<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
        token: &CancellationToken,
    ) -> Result<ApiResponse<T>, ApiError> {
        let span = request_span(options.method.as_str(), endpoint);
        let raw = self.execute(endpoint, options, token).instrument(span).await?;
        typed(raw)
    }

    /// Perform a request, retrying hard failures with capped exponential backoff.
    ///
    /// Returns the first success, or the last error once attempts run out.
    pub async fn request_with_retry<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.request_with_retry_cancellable(endpoint, options, &CancellationToken::new())
            .await
    }

    /// [`request_with_retry`](Self::request_with_retry) that stops before the
    /// next network call or during a backoff sleep when `token` fires.
    pub async fn request_with_retry_cancellable<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
        token: &CancellationToken,
    ) -> Result<ApiResponse<T>, ApiError> {
        let policy = self.inner.retry;
        let mut attempt = 1;

        loop {
            let span = request_span(options.method.as_str(), endpoint);
            span.record("attempt", attempt);

            match self.execute(endpoint, options.clone(), token).instrument(span).await {
                Ok(raw) => return typed(raw),
                Err(err) if !err.is_retryable() || !policy.has_next(attempt) => return Err(err),
                Err(err) => {
                    let delay = policy.delay_for(attempt);
                    tracing::info!(
                        endpoint = %endpoint,
                        attempt,
                        max_attempts = policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying request"
                    );
                    sleep_or_cancel(delay, token).await?;
                    attempt += 1;
                }
            }
        }
    }

    /// GET an endpoint.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<ApiResponse<T>, ApiError> {
        self.request(endpoint, RequestOptions::get()).await
    }

    /// POST a JSON body.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.request(endpoint, RequestOptions::post(to_body(body)?)).await
    }

    /// PUT a JSON body.
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.request(endpoint, RequestOptions::put(to_body(body)?)).await
    }

    /// DELETE an endpoint.
    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<ApiResponse<T>, ApiError> {
        self.request(endpoint, RequestOptions::delete()).await
    }

    /// Probe `GET /health`. Any 2xx within the health timeout is healthy;
    /// every failure is reported as `false`.
    pub async fn health_check(&self) -> bool {
        let url = self.inner.requests.url(HEALTH_ENDPOINT);
        let probe = self.inner.http.get(&url).send();

        match with_timeout(self.inner.config.health_timeout(), probe).await {
            Ok(Ok(response)) => response.status().is_success(),
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "health check failed");
                false
            }
            Err(e) => {
                tracing::debug!(error = %e, "health check timed out");
                false
            }
        }
    }

    /// Drop every cached response, returning how many were removed.
    pub fn clear_cache(&self) -> usize {
        self.inner.cache.clear()
    }

    /// Cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }

    /// Number of distinct requests currently on the wire.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.lock().len()
    }

    async fn execute(&self, endpoint: &str, options: RequestOptions, token: &CancellationToken) -> FetchResult {
        if !endpoint.starts_with('/') {
            return Err(ApiError::InvalidRequest(format!(
                "endpoint must start with '/': {endpoint}"
            )));
        }

        let config = &self.inner.config;
        let key = fingerprint(endpoint, &options);

        if config.enable_cache && options.cacheable {
            if let Some(hit) = self.inner.cache.get(&key) {
                tracing::debug!(endpoint = %endpoint, "cache hit");
                return Ok(hit.stamped().with_origin(ResponseOrigin::Cache));
            }
        }

        check_cancelled(token)?;

        let url = self.inner.requests.url(endpoint);
        let network: BoxFuture<'static, FetchResult> = if config.dedupe_in_flight {
            fetch_shared(&self.inner, &key, url, options)
        } else {
            fetch_and_store(Arc::clone(&self.inner), key, url, options).boxed()
        };

        match run_or_cancel(network, token).await? {
            Ok(response) => Ok(response),
            Err(err) => self.fallback(endpoint, err),
        }
    }

    fn fallback(&self, endpoint: &str, err: ApiError) -> FetchResult {
        tracing::warn!(endpoint = %endpoint, error = %err, "API request failed");

        if self.inner.config.enable_mock {
            if let Some(mock) = self.inner.mock.get(endpoint) {
                tracing::warn!(endpoint = %endpoint, "serving mock data");
                return Ok(mock.stamped().with_origin(ResponseOrigin::Mock));
            }
        }

        Err(err)
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.base_url)
            .field("cache", &self.inner.cache)
            .field("mock_endpoints", &self.inner.mock.len())
            .finish()
    }
}

/// Decode the payload. A failure envelope whose payload does not fit `T`
/// surfaces as [`ApiError::Rejected`] rather than a parse error.
fn typed<T: DeserializeOwned>(raw: RawResponse) -> Result<ApiResponse<T>, ApiError> {
    if raw.success {
        return raw.into_typed().map_err(ApiError::parse);
    }
    let reason = raw.error.clone().unwrap_or_else(|| raw.message.clone());
    raw.into_typed().map_err(|_| ApiError::Rejected { reason })
}

fn to_body<B: Serialize>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::InvalidRequest(format!("unserializable body: {e}")))
}
