//! Mock backend built on wiremock.

use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Mock backend with helpers for the envelope-shaped endpoints.
pub struct TestHttpServer {
    server: MockServer,
}

impl TestHttpServer {
    /// Start a new mock server
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Server base URL, suitable for `ApiConfig::base_url`
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// URL for a specific path
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.server.uri(), path)
    }

    /// Access the underlying MockServer
    pub fn inner(&self) -> &MockServer {
        &self.server
    }

    /// Register a GET endpoint that returns JSON
    pub async fn get_json<T: Serialize>(&self, endpoint: &str, response: &T) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .mount(&self.server)
            .await;
    }

    /// Register a GET endpoint that only answers when a query parameter matches
    pub async fn get_json_with_query<T: Serialize>(
        &self,
        endpoint: &str,
        query: (&str, &str),
        response: &T,
    ) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .and(query_param(query.0, query.1))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .mount(&self.server)
            .await;
    }

    /// Register a POST endpoint that returns JSON
    pub async fn post_json<T: Serialize>(&self, endpoint: &str, response: &T) {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .mount(&self.server)
            .await;
    }

    /// Register a POST endpoint that answers only bodies containing `expected`
    pub async fn post_json_matching(&self, endpoint: &str, expected: Value, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .and(body_partial_json(expected))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Register an endpoint that returns an error status with a JSON body
    pub async fn error(&self, endpoint: &str, status: u16, message: &str) {
        Mock::given(path(endpoint))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(json!({ "error": message })),
            )
            .mount(&self.server)
            .await;
    }

    /// Register an endpoint that returns a 200 with a body that is not JSON
    pub async fn garbage(&self, endpoint: &str) {
        Mock::given(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&self.server)
            .await;
    }

    /// Register an endpoint with simulated latency
    pub async fn with_latency<T: Serialize>(&self, endpoint: &str, response: &T, latency: Duration) {
        Mock::given(path(endpoint))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(response)
                    .set_delay(latency),
            )
            .mount(&self.server)
            .await;
    }

    /// Register a sequence of responses, served in order, one request each
    pub async fn sequence(&self, endpoint: &str, responses: Vec<ResponseTemplate>) {
        for (i, response) in responses.into_iter().enumerate() {
            Mock::given(path(endpoint))
                .respond_with(response)
                .up_to_n_times(1)
                .with_priority((i + 1).min(u8::MAX as usize) as u8)
                .mount(&self.server)
                .await;
        }
    }

    /// Number of requests received for a path
    pub async fn request_count(&self, endpoint: &str) -> usize {
        self.received_requests()
            .await
            .iter()
            .filter(|r| r.url.path() == endpoint)
            .count()
    }

    /// Assert the number of requests received for a path
    pub async fn verify_received(&self, endpoint: &str, times: usize) {
        let count = self.request_count(endpoint).await;
        assert_eq!(
            count, times,
            "Expected {} requests to {}, got {}",
            times, endpoint, count
        );
    }

    /// Get all received requests
    pub async fn received_requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// JSON bodies of every request received for a path
    pub async fn received_json(&self, endpoint: &str) -> Vec<Value> {
        self.received_requests()
            .await
            .iter()
            .filter(|r| r.url.path() == endpoint)
            .filter_map(|r| serde_json::from_slice(&r.body).ok())
            .collect()
    }

    /// Drop all mounted mocks and recorded requests
    pub async fn reset(&self) {
        self.server.reset().await;
    }
}

/// Common response templates
pub mod responses {
    use super::*;

    pub fn ok_json<T: Serialize>(body: &T) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(body)
    }

    pub fn not_found() -> ResponseTemplate {
        ResponseTemplate::new(404).set_body_json(json!({ "error": "Not found" }))
    }

    pub fn server_error() -> ResponseTemplate {
        ResponseTemplate::new(500).set_body_json(json!({ "error": "Internal server error" }))
    }

    pub fn service_unavailable() -> ResponseTemplate {
        ResponseTemplate::new(503).set_body_json(json!({ "error": "Service unavailable" }))
    }

    pub fn delayed<T: Serialize>(body: &T, delay: Duration) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(body).set_delay(delay)
    }
}
