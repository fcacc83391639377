//! Remote call backend
//!
//! POSTs step parameters as a JSON body to the tool's endpoint and decodes
//! the JSON response. Anything but a 2xx with a decodable body is an error.

use crate::errors::{FlowError, Result};
use crate::types::Parameters;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Default request timeout (30 seconds)
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum number of error body bytes kept in an error message
const MAX_ERROR_BODY: usize = 512;

/// Synchronous request/response tool backend
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Call `endpoint` with `parameters`, returning the decoded response body
    async fn call(&self, endpoint: &str, parameters: &Parameters) -> Result<Value>;
}

/// reqwest-backed remote backend
#[derive(Debug, Clone)]
pub struct HttpRemoteBackend {
    client: Client,
    timeout: Duration,
    auth_token: Option<String>,
}

impl HttpRemoteBackend {
    /// Create backend with the default timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_REMOTE_TIMEOUT)
    }

    /// Create backend with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            timeout,
            auth_token: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every call
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl RemoteBackend for HttpRemoteBackend {
    async fn call(&self, endpoint: &str, parameters: &Parameters) -> Result<Value> {
        let mut request = self.client.post(endpoint).json(parameters);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FlowError::Timeout {
                    duration_ms: self.timeout.as_millis() as u64,
                }
            } else {
                FlowError::Backend(format!("Request to {} failed: {}", endpoint, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(FlowError::Backend(format!("HTTP {}: {}", status, body)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FlowError::Backend(format!("Failed to decode response: {}", e)))
    }
}
