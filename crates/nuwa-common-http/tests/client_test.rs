//! ApiClient behaviour against a mock backend.

use nuwa_common_config::ApiConfig;
use nuwa_common_core::{Page, ResponseOrigin, Timestamp, Wish};
use nuwa_common_http::{ApiClient, ApiError, CancellationToken, ErrorKind, EvictionCause, MockDataProvider, RequestOptions};
use nuwa_test_utils::fixtures::{ok_envelope, page_envelope, wish};
use nuwa_test_utils::{responses, TestHttpServer};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::matchers::path;
use wiremock::{Mock, Request, ResponseTemplate};

const WISHES: &str = "/api/wishes/list_wishes";
const TASKS: &str = "/api/tasks/list_tasks";

fn config(server: &TestHttpServer) -> ApiConfig {
    ApiConfig {
        base_url: server.url(),
        timeout_ms: 1_000,
        retry_count: 3,
        retry_base_delay_ms: 20,
        retry_max_delay_ms: 200,
        enable_mock: false,
        ..ApiConfig::default()
    }
}

fn client(config: ApiConfig) -> ApiClient {
    ApiClient::new(config).unwrap()
}

fn wishes_page() -> Value {
    page_envelope(vec![wish(1, "咖啡助手", "做咖啡"), wish(2, "动漫推荐", "推荐动漫")], 1, 10)
}

#[tokio::test]
async fn test_healthy_backend_returns_envelope_with_fresh_timestamp() {
    let server = TestHttpServer::start().await;
    let body = wishes_page();
    server.get_json(WISHES, &body).await;

    let before = Timestamp::now();
    let response = client(config(&server)).get::<Value>(WISHES).await.unwrap();

    assert!(response.success);
    assert_eq!(response.message, "ok");
    assert_eq!(response.error, None);
    assert_eq!(response.data, body["data"]);
    assert!(response.timestamp.as_datetime() >= before.as_datetime());
}

#[tokio::test]
async fn test_typed_list_decodes_models() {
    let server = TestHttpServer::start().await;
    server.get_json(WISHES, &wishes_page()).await;

    let response = client(config(&server)).get::<Page<Wish>>(WISHES).await.unwrap();
    assert_eq!(response.data.total, 2);
    assert_eq!(response.data.items[0].id, 1);
}

#[tokio::test]
async fn test_cache_hit_skips_network() {
    let server = TestHttpServer::start().await;
    server.get_json(WISHES, &wishes_page()).await;
    let client = client(config(&server));

    let first = client.get::<Value>(WISHES).await.unwrap();
    let second = client.get::<Value>(WISHES).await.unwrap();

    assert_eq!(first.data, second.data);
    assert_eq!(first.origin, ResponseOrigin::Network);
    assert_eq!(second.origin, ResponseOrigin::Cache);
    assert!(second.timestamp.as_datetime() >= first.timestamp.as_datetime());
    server.verify_received(WISHES, 1).await;

    let stats = client.cache_stats();
    assert_eq!((stats.hits, stats.stores, stats.entries), (1, 1, 1));
}

#[tokio::test]
async fn test_cache_disabled_always_fetches() {
    let server = TestHttpServer::start().await;
    server.get_json(WISHES, &wishes_page()).await;
    let client = client(ApiConfig {
        enable_cache: false,
        ..config(&server)
    });

    client.get::<Value>(WISHES).await.unwrap();
    client.get::<Value>(WISHES).await.unwrap();
    server.verify_received(WISHES, 2).await;
}

#[tokio::test]
async fn test_uncacheable_request_bypasses_cache() {
    let server = TestHttpServer::start().await;
    server.get_json(WISHES, &wishes_page()).await;
    let client = client(config(&server));

    for _ in 0..2 {
        client
            .request::<Value>(WISHES, RequestOptions::get().no_cache())
            .await
            .unwrap();
    }
    server.verify_received(WISHES, 2).await;
    assert_eq!(client.cache_stats().entries, 0);
}

#[tokio::test]
async fn test_post_bodies_are_cached_separately() {
    let server = TestHttpServer::start().await;
    server.post_json("/api/search", &ok_envelope(json!({"hits": 0}))).await;
    let client = client(config(&server));

    client.post::<Value, _>("/api/search", &json!({"q": "a"})).await.unwrap();
    client.post::<Value, _>("/api/search", &json!({"q": "b"})).await.unwrap();
    client.post::<Value, _>("/api/search", &json!({"q": "a"})).await.unwrap();

    server.verify_received("/api/search", 2).await;
    assert_eq!(
        server.received_json("/api/search").await,
        vec![json!({"q": "a"}), json!({"q": "b"})]
    );
}

#[tokio::test]
async fn test_timeout_is_bounded() {
    let server = TestHttpServer::start().await;
    server
        .with_latency(WISHES, &wishes_page(), Duration::from_secs(5))
        .await;
    let client = client(ApiConfig {
        timeout_ms: 100,
        ..config(&server)
    });

    let started = Instant::now();
    let err = client.get::<Value>(WISHES).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(err.to_string(), "Request timeout after 100ms");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_mock_fallback_is_not_cached() {
    let server = TestHttpServer::start().await;
    server.error(WISHES, 500, "boom").await;
    let client = client(ApiConfig {
        enable_mock: true,
        ..config(&server)
    });

    let response = client.get::<Page<Wish>>(WISHES).await.unwrap();
    assert!(response.success);
    assert_eq!(response.origin, ResponseOrigin::Mock);
    assert_eq!(response.message, "Mock data loaded successfully");
    assert_eq!(response.data.items.len(), 2);

    client.get::<Page<Wish>>(WISHES).await.unwrap();
    server.verify_received(WISHES, 2).await;
    assert_eq!(client.cache_stats().stores, 0);
}

#[tokio::test]
async fn test_mock_fallback_on_malformed_body() {
    let server = TestHttpServer::start().await;
    server.garbage("/api/agents/list_agents").await;
    let client = client(ApiConfig {
        enable_mock: true,
        ..config(&server)
    });

    let response = client
        .get::<Value>("/api/agents/list_agents?page=1&size=10")
        .await
        .unwrap();
    assert_eq!(response.data["items"][0]["id"], 1);
}

#[tokio::test]
async fn test_failure_envelope_without_data_is_not_replaced_by_mock() {
    let server = TestHttpServer::start().await;
    server
        .get_json(WISHES, &json!({"success": false, "message": "list failed", "error": "db down"}))
        .await;
    let client = client(ApiConfig {
        enable_mock: true,
        ..config(&server)
    });

    let response = client.get::<Value>(WISHES).await.unwrap();
    assert!(!response.success);
    assert_eq!(response.message, "list failed");
    assert_eq!(response.error.as_deref(), Some("db down"));
    assert_eq!(response.origin, ResponseOrigin::Network);

    let err = client.get::<Page<Wish>>(WISHES).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Rejected);
    assert_eq!(err.to_string(), "backend reported failure: db down");
}

#[tokio::test]
async fn test_missing_mock_propagates_original_error() {
    let server = TestHttpServer::start().await;
    server.error("/api/modules/list_modules", 503, "down").await;
    let client = client(ApiConfig {
        enable_mock: true,
        ..config(&server)
    });

    let err = client
        .get::<Value>("/api/modules/list_modules")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Http);
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn test_mock_disabled_propagates_error() {
    let server = TestHttpServer::start().await;
    server.garbage(WISHES).await;

    let err = client(config(&server)).get::<Value>(WISHES).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[tokio::test]
async fn test_retry_exhausts_attempts_and_returns_last_error() {
    let server = TestHttpServer::start().await;
    server.error(TASKS, 500, "boom").await;
    let client = client(config(&server));

    let err = client
        .request_with_retry::<Value>(TASKS, RequestOptions::get())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(500));
    server.verify_received(TASKS, 3).await;
}

/// Records when each request arrived, then fails it.
struct FailAndRecord {
    arrivals: Arc<Mutex<Vec<Instant>>>,
}

impl wiremock::Respond for FailAndRecord {
    fn respond(&self, _: &Request) -> ResponseTemplate {
        self.arrivals.lock().unwrap().push(Instant::now());
        responses::server_error()
    }
}

#[tokio::test]
async fn test_retry_backoff_grows_between_attempts() {
    let server = TestHttpServer::start().await;
    let arrivals = Arc::new(Mutex::new(Vec::new()));
    Mock::given(path(TASKS))
        .respond_with(FailAndRecord {
            arrivals: Arc::clone(&arrivals),
        })
        .mount(server.inner())
        .await;
    let client = client(ApiConfig {
        retry_base_delay_ms: 50,
        retry_max_delay_ms: 1_000,
        ..config(&server)
    });

    client
        .request_with_retry::<Value>(TASKS, RequestOptions::get())
        .await
        .unwrap_err();

    let arrivals = arrivals.lock().unwrap().clone();
    assert_eq!(arrivals.len(), 3);
    let first_gap = arrivals[1] - arrivals[0];
    let second_gap = arrivals[2] - arrivals[1];
    assert!(first_gap >= Duration::from_millis(100), "first gap {first_gap:?}");
    assert!(second_gap >= Duration::from_millis(200), "second gap {second_gap:?}");
}

#[tokio::test]
async fn test_retry_recovers_after_failure() {
    let server = TestHttpServer::start().await;
    server
        .sequence(
            TASKS,
            vec![
                responses::service_unavailable(),
                responses::ok_json(&page_envelope(vec![json!({"id": 9})], 1, 10)),
            ],
        )
        .await;
    let client = client(config(&server));

    let response = client
        .request_with_retry::<Value>(TASKS, RequestOptions::get())
        .await
        .unwrap();

    assert_eq!(response.data["items"][0]["id"], 9);
    server.verify_received(TASKS, 2).await;
}

#[tokio::test]
async fn test_single_attempt_policy() {
    let server = TestHttpServer::start().await;
    server.error(TASKS, 500, "boom").await;
    let client = client(ApiConfig {
        retry_count: 1,
        ..config(&server)
    });

    assert!(client
        .request_with_retry::<Value>(TASKS, RequestOptions::get())
        .await
        .is_err());
    server.verify_received(TASKS, 1).await;
}

#[tokio::test]
async fn test_retry_with_mock_fallback_succeeds_first_attempt() {
    let server = TestHttpServer::start().await;
    server.error(TASKS, 500, "boom").await;
    let client = client(ApiConfig {
        enable_mock: true,
        ..config(&server)
    });

    let response = client
        .request_with_retry::<Value>(TASKS, RequestOptions::get())
        .await
        .unwrap();
    assert_eq!(response.message, "Mock data loaded successfully");
    server.verify_received(TASKS, 1).await;
}

#[tokio::test]
async fn test_concurrent_requests_share_one_fetch() {
    let server = TestHttpServer::start().await;
    server
        .with_latency(WISHES, &wishes_page(), Duration::from_millis(200))
        .await;
    let client = client(config(&server));

    let (a, b, c) = tokio::join!(
        client.get::<Value>(WISHES),
        client.get::<Value>(WISHES),
        client.get::<Value>(WISHES)
    );

    assert_eq!(a.unwrap().data, b.unwrap().data);
    assert!(c.is_ok());
    server.verify_received(WISHES, 1).await;
    assert_eq!(client.in_flight(), 0);
    assert_eq!(client.cache_stats().stores, 1);
}

#[tokio::test]
async fn test_concurrent_requests_without_dedupe_each_fetch() {
    let server = TestHttpServer::start().await;
    server
        .with_latency(WISHES, &wishes_page(), Duration::from_millis(100))
        .await;
    let client = client(ApiConfig {
        dedupe_in_flight: false,
        ..config(&server)
    });

    let (a, b) = tokio::join!(client.get::<Value>(WISHES), client.get::<Value>(WISHES));
    assert!(a.is_ok() && b.is_ok());
    server.verify_received(WISHES, 2).await;
}

#[tokio::test]
async fn test_cancellation_interrupts_request() {
    let server = TestHttpServer::start().await;
    server
        .with_latency(WISHES, &wishes_page(), Duration::from_secs(5))
        .await;
    let client = client(ApiConfig {
        timeout_ms: 10_000,
        ..config(&server)
    });

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = client
        .request_cancellable::<Value>(WISHES, RequestOptions::get(), &token)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_call_after_cancelled_shared_fetch_goes_to_network() {
    let server = TestHttpServer::start().await;
    server
        .sequence(
            WISHES,
            vec![
                responses::delayed(&wishes_page(), Duration::from_secs(3)),
                responses::ok_json(&wishes_page()),
            ],
        )
        .await;
    let client = client(ApiConfig {
        timeout_ms: 500,
        ..config(&server)
    });

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });
    let err = client
        .request_cancellable::<Value>(WISHES, RequestOptions::get(), &token)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Cancelled));
    assert_eq!(client.in_flight(), 0);

    tokio::time::sleep(Duration::from_millis(600)).await;
    let response = client.get::<Page<Wish>>(WISHES).await.unwrap();
    assert_eq!(response.data.items.len(), 2);
    assert_eq!(response.origin, ResponseOrigin::Network);
    server.verify_received(WISHES, 2).await;
}

#[tokio::test]
async fn test_cancelling_one_waiter_keeps_shared_fetch_for_others() {
    let server = TestHttpServer::start().await;
    server
        .with_latency(WISHES, &wishes_page(), Duration::from_millis(200))
        .await;
    let client = client(config(&server));

    let token = CancellationToken::new();
    token_after(&token, Duration::from_millis(50));
    let (cancelled, kept) = tokio::join!(
        client.request_cancellable::<Value>(WISHES, RequestOptions::get(), &token),
        client.get::<Value>(WISHES)
    );

    assert!(matches!(cancelled, Err(ApiError::Cancelled)));
    assert!(kept.unwrap().success);
    server.verify_received(WISHES, 1).await;
    assert_eq!(client.in_flight(), 0);
}

fn token_after(token: &CancellationToken, delay: Duration) {
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        trigger.cancel();
    });
}

#[tokio::test]
async fn test_cancellation_interrupts_backoff() {
    let server = TestHttpServer::start().await;
    server.error(TASKS, 500, "boom").await;
    let client = client(ApiConfig {
        retry_base_delay_ms: 5_000,
        retry_max_delay_ms: 30_000,
        ..config(&server)
    });

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = client
        .request_with_retry_cancellable::<Value>(TASKS, RequestOptions::get(), &token)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(3));
    server.verify_received(TASKS, 1).await;
}

#[tokio::test]
async fn test_cancellation_does_not_fall_back_to_mock() {
    let server = TestHttpServer::start().await;
    server
        .with_latency(WISHES, &wishes_page(), Duration::from_secs(5))
        .await;
    let client = client(ApiConfig {
        enable_mock: true,
        timeout_ms: 10_000,
        ..config(&server)
    });

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = client
        .request_cancellable::<Value>(WISHES, RequestOptions::get(), &token)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Cancelled));
}

#[tokio::test]
async fn test_health_check() {
    let server = TestHttpServer::start().await;
    server.get_json("/health", &json!({"status": "ok"})).await;
    assert!(client(config(&server)).health_check().await);

    let unhealthy = TestHttpServer::start().await;
    unhealthy.error("/health", 500, "down").await;
    assert!(!client(config(&unhealthy)).health_check().await);
}

#[tokio::test]
async fn test_health_check_times_out() {
    let server = TestHttpServer::start().await;
    server
        .with_latency("/health", &json!({"status": "ok"}), Duration::from_secs(2))
        .await;
    let client = client(ApiConfig {
        health_timeout_ms: 100,
        ..config(&server)
    });

    let started = Instant::now();
    assert!(!client.health_check().await);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_health_check_unreachable() {
    let client = client(ApiConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        ..ApiConfig::default()
    });
    assert!(!client.health_check().await);
}

#[tokio::test]
async fn test_eviction_listener_sees_capacity_and_clear() {
    let server = TestHttpServer::start().await;
    server.get_json(WISHES, &wishes_page()).await;
    server.get_json(TASKS, &page_envelope(vec![], 1, 10)).await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let client = ApiClient::builder(ApiConfig {
        cache_capacity: 1,
        ..config(&server)
    })
    .mock_data(MockDataProvider::empty())
    .on_evict(move |key, cause| sink.lock().unwrap().push((key.to_string(), cause)))
    .build()
    .unwrap();

    client.get::<Value>(WISHES).await.unwrap();
    client.get::<Value>(TASKS).await.unwrap();
    assert_eq!(client.clear_cache(), 1);

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].0.starts_with(WISHES));
    assert_eq!(seen[0].1, EvictionCause::Capacity);
    assert!(seen[1].0.starts_with(TASKS));
    assert_eq!(seen[1].1, EvictionCause::Cleared);
}
