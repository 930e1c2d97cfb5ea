use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Network(String),
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode response: {0}")]
    Decode(String),
}

/// Performs one request against the backend and returns its JSON payload.
///
/// Any non-success outcome is reported as a `TransportError`; callers
/// treat all variants the same way.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, body: &Value) -> Result<Value, TransportError>;
}

/// JSON-over-HTTP transport bound to a single endpoint
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    /// Endpoint built from a base URL and a path, tolerating a trailing
    /// slash on the base.
    pub fn with_base(base_url: &str, path: &str) -> Self {
        Self::new(&format!("{}{}", base_url.trim_end_matches('/'), path))
    }

    pub fn timeout(mut self, timeout: Duration) -> Result<Self, TransportError> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(self)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, body: &Value) -> Result<Value, TransportError> {
        tracing::debug!(endpoint = %self.endpoint, "sending request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}
