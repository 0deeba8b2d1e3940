//! HTTP client for the chat backend.
//!
//! The backend authenticates every request through cookies set by the auth
//! endpoints, so one cookie-carrying client is shared by the identity provider
//! and the session store.

use freya_core::error::{FreyaError, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Cookie-carrying client bound to one backend base URL.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FreyaError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(self.client.get(self.url(path))).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.send(self.client.put(self.url(path)).json(body)).await
    }

    /// POSTs without a body and ignores the response payload.
    pub async fn post_empty(&self, path: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url(path))
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| FreyaError::Serialization {
            format: "JSON".to_string(),
            message: format!("Failed to parse backend response: {}", e),
        })
    }
}

fn transport_error(error: reqwest::Error) -> FreyaError {
    FreyaError::data_access(format!("Backend request failed: {}", error))
}

/// Maps a non-success response to an error, preferring the backend's `error` field.
pub(crate) fn status_error(status: StatusCode, body: &str) -> FreyaError {
    let message = error_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    });
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        FreyaError::auth(message)
    } else {
        FreyaError::remote(status.as_u16(), message)
    }
}

pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = BackendClient::new("http://localhost:3000/").unwrap();
        assert_eq!(
            client.url("/api/chat/sessions"),
            "http://localhost:3000/api/chat/sessions"
        );
        assert_eq!(client.url("api/auth/user"), "http://localhost:3000/api/auth/user");
    }

    #[test]
    fn test_status_error_prefers_backend_message() {
        let err = status_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"Failed to load sessions"}"#,
        );
        match err {
            FreyaError::Remote { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Failed to load sessions");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unauthorized_maps_to_auth() {
        let err = status_error(StatusCode::UNAUTHORIZED, "not json");
        assert!(err.is_auth());
        assert!(err.to_string().contains("Unauthorized"));
    }
}
