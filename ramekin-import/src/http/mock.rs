//! In-memory HTTP client for tests.

use async_trait::async_trait;
use reqwest::Method;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use super::client::{HttpClient, HttpRequest, HttpResponse};
use crate::error::FetchError;

/// Mock response for testing.
#[derive(Clone)]
pub enum MockResponse {
    /// 200 with a JSON body.
    Json(String),
    /// 200 with a binary body.
    Bytes(Vec<u8>),
    /// Arbitrary status with a text body.
    Status(u16, String),
    /// Transport failure (connection refused, timeout, ...).
    Error(String),
}

/// Mock HTTP client for testing.
///
/// Responses are keyed by method and exact URL (query string included).
/// Unknown URLs answer 404. Every request is recorded.
#[derive(Default)]
pub struct MockClient {
    responses: HashMap<(Method, String), MockResponse>,
    latency: Option<Duration>,
    requests: Mutex<Vec<HttpRequest>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a response for a method and URL.
    pub fn with_response(mut self, method: Method, url: &str, response: MockResponse) -> Self {
        self.responses.insert((method, url.to_string()), response);
        self
    }

    /// Add a JSON response for a GET.
    pub fn with_json(self, url: &str, body: &str) -> Self {
        self.with_response(Method::GET, url, MockResponse::Json(body.to_string()))
    }

    /// Add a JSON response for a POST.
    pub fn with_post_json(self, url: &str, body: &str) -> Self {
        self.with_response(Method::POST, url, MockResponse::Json(body.to_string()))
    }

    /// Add a binary response for a GET.
    pub fn with_bytes(self, url: &str, bytes: Vec<u8>) -> Self {
        self.with_response(Method::GET, url, MockResponse::Bytes(bytes))
    }

    /// Answer a GET with a bare status.
    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.with_response(Method::GET, url, MockResponse::Status(status, String::new()))
    }

    /// Answer a POST with a bare status.
    pub fn with_post_status(self, url: &str, status: u16) -> Self {
        self.with_response(Method::POST, url, MockResponse::Status(status, String::new()))
    }

    /// Fail a GET at the transport level.
    pub fn with_error(self, url: &str, error: &str) -> Self {
        self.with_response(Method::GET, url, MockResponse::Error(error.to_string()))
    }

    /// Delay every response, so concurrent requests overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// All requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// URLs of received requests that start with `prefix`, in arrival order.
    pub fn requested_urls(&self, prefix: &str) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| r.url)
            .filter(|url| url.starts_with(prefix))
            .collect()
    }

    /// Highest number of requests that were being served at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let key = (request.method.clone(), request.url.clone());
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.responses.get(&key) {
            Some(MockResponse::Json(body)) => Ok(HttpResponse {
                status: 200,
                body: body.as_bytes().to_vec(),
            }),
            Some(MockResponse::Bytes(bytes)) => Ok(HttpResponse {
                status: 200,
                body: bytes.clone(),
            }),
            Some(MockResponse::Status(status, body)) => Ok(HttpResponse {
                status: *status,
                body: body.as_bytes().to_vec(),
            }),
            Some(MockResponse::Error(e)) => Err(FetchError::Transport(e.clone())),
            None => Ok(HttpResponse {
                status: 404,
                body: b"Not found".to_vec(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_url_is_not_found() {
        let client = MockClient::new();
        let response = client
            .execute(HttpRequest::get("http://example.com/missing"))
            .await
            .unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_routes_by_method() {
        let client = MockClient::new().with_post_json("http://example.com/login", r#"{"ok":true}"#);

        let get = client
            .execute(HttpRequest::get("http://example.com/login"))
            .await
            .unwrap();
        assert_eq!(get.status, 404);

        let post = client
            .execute(HttpRequest::post("http://example.com/login"))
            .await
            .unwrap();
        assert_eq!(post.status, 200);
        assert_eq!(post.body, br#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn test_records_requests_in_order() {
        let client = MockClient::new().with_error("http://example.com/b", "connection refused");

        let _ = client.execute(HttpRequest::get("http://example.com/a")).await;
        let err = client
            .execute(HttpRequest::get("http://example.com/b"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));

        assert_eq!(
            client.requested_urls("http://example.com/"),
            vec!["http://example.com/a", "http://example.com/b"]
        );
    }
}
