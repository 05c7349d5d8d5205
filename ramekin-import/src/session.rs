//! Read-only state shared by every request of one import run.

use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::auth::AuthToken;
use crate::error::FetchError;
use crate::http::{HttpClient, HttpRequest, HttpResponse};

/// HTTP client plus the run's credentials.
///
/// Cloned into every item task; nothing in it changes after authentication.
#[derive(Clone)]
pub struct Session {
    client: Arc<dyn HttpClient>,
    auth: Option<AuthToken>,
    username: String,
}

impl Session {
    /// An unauthenticated session, used for the login exchange itself.
    pub fn new(client: Arc<dyn HttpClient>, username: impl Into<String>) -> Self {
        Self {
            client,
            auth: None,
            username: username.into(),
        }
    }

    pub fn with_auth(mut self, auth: AuthToken) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Send a request as-is, without adding credentials.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let url = request.url.clone();
        self.client.execute(request).await?.error_for_status(&url)
    }

    /// Send a request with the run's `Authorization` header attached.
    pub async fn send_authenticated(
        &self,
        mut request: HttpRequest,
    ) -> Result<HttpResponse, FetchError> {
        if let Some(auth) = &self.auth {
            request = request.header("Authorization", auth.header_value());
        }
        self.send(request).await
    }

    /// Authenticated GET decoded from JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let request = HttpRequest::get(url).header("Accept", "application/json");
        let response = self.send_authenticated(request).await?;
        response.json(url)
    }

    /// GET a binary body, refusing anything larger than `max_bytes`.
    pub async fn get_bytes(
        &self,
        url: &str,
        authenticated: bool,
        max_bytes: usize,
    ) -> Result<Vec<u8>, FetchError> {
        let request = HttpRequest::get(url);
        let response = if authenticated {
            self.send_authenticated(request).await?
        } else {
            self.send(request).await?
        };

        if response.body.len() > max_bytes {
            return Err(FetchError::TooLarge {
                url: url.to_string(),
                size: response.body.len(),
                max: max_bytes,
            });
        }
        Ok(response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockClient;

    #[tokio::test]
    async fn test_authenticated_get_adds_header() {
        let client = Arc::new(MockClient::new().with_json("http://a/api/x", r#"{"v":1}"#));
        let session = Session::new(client.clone(), "me").with_auth(AuthToken::bearer("tok"));

        let value: serde_json::Value = session.get_json("http://a/api/x").await.unwrap();
        assert_eq!(value["v"], 1);

        let requests = client.requests();
        assert_eq!(requests[0].header_value("Authorization"), Some("Bearer tok"));
        assert_eq!(requests[0].header_value("Accept"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_unauthenticated_bytes_have_no_header() {
        let client = Arc::new(MockClient::new().with_bytes("http://img/x.jpg", vec![1, 2, 3]));
        let session = Session::new(client.clone(), "me").with_auth(AuthToken::bearer("tok"));

        let bytes = session.get_bytes("http://img/x.jpg", false, 10).await.unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
        assert_eq!(client.requests()[0].header_value("Authorization"), None);
    }

    #[tokio::test]
    async fn test_bytes_over_limit_are_rejected() {
        let client = Arc::new(MockClient::new().with_bytes("http://img/x.jpg", vec![0; 11]));
        let session = Session::new(client, "me");

        let err = session.get_bytes("http://img/x.jpg", true, 10).await.unwrap_err();
        assert!(matches!(err, FetchError::TooLarge { size: 11, max: 10, .. }));
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let client = Arc::new(MockClient::new());
        let session = Session::new(client, "me");

        let err = session
            .get_json::<serde_json::Value>("http://a/missing")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }
}
