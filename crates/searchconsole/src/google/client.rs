//! Google API Authenticated HTTP Client
//!
//! Injects a fresh bearer token into every request and maps Google's error
//! envelope onto [`TransportError`].

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::auth::Authorizer;
use crate::transport::TransportError;

/// Google API HTTP client with OAuth token injection
#[derive(Debug, Clone)]
pub struct GoogleClient {
    client: Client,
    authorizer: Arc<Authorizer>,
}

impl GoogleClient {
    pub fn new(client: Client, authorizer: Arc<Authorizer>) -> Self {
        Self { client, authorizer }
    }

    /// Make an authenticated GET request
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, TransportError> {
        let token = self.authorizer.access_token().await?;
        let builder = self.client.get(url).bearer_auth(token);
        self.execute_request(builder).await
    }

    /// Make an authenticated POST request with JSON body
    pub async fn post<B, T>(&self, url: &str, body: &B) -> Result<T, TransportError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let token = self.authorizer.access_token().await?;
        let builder = self.client.post(url).bearer_auth(token).json(body);
        self.execute_request(builder).await
    }

    /// Execute a request and handle Google API response patterns
    async fn execute_request<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, TransportError> {
        debug!("Executing Google API request");

        let response = builder.send().await?;
        let status = response.status();
        debug!("Response status: {}", status);

        let body = response.text().await?;

        if !status.is_success() {
            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!("Rate limited by Google API");
            }
            let message = extract_error_message(&body, status);
            error!("Google API error {}: {}", status.as_u16(), message);
            return Err(TransportError::Api {
                status: status.as_u16(),
                message,
                body,
            });
        }

        // Empty successful responses decode as an empty object.
        let text = if body.trim().is_empty() { "{}" } else { body.as_str() };
        serde_json::from_str(text).map_err(|source| TransportError::Decode { source, body })
    }
}

/// Extract the message from Google's error envelope:
/// `{"error": {"code": 400, "message": "...", "errors": [...]}}`
pub(crate) fn extract_error_message(body: &str, status: StatusCode) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(String::from)
        .unwrap_or_else(|| format!("HTTP {} error", status))
}
