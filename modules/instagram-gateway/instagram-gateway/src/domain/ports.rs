//! Output ports (interfaces) for domain services.

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Fully resolved outbound call: the URL already carries every query
/// parameter, including the credential.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub body: Option<serde_json::Value>,
    /// Abort reading the body once it grows past this many bytes.
    pub max_body_bytes: Option<usize>,
}

impl TransportRequest {
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self {
            method: HttpMethod::Get,
            url,
            body: None,
            max_body_bytes: None,
        }
    }

    #[must_use]
    pub fn post(url: Url, body: Option<serde_json::Value>) -> Self {
        Self {
            method: HttpMethod::Post,
            url,
            body,
            max_body_bytes: None,
        }
    }

    #[must_use]
    pub fn with_body_limit(mut self, max_bytes: usize) -> Self {
        self.max_body_bytes = Some(max_bytes);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures below the HTTP layer: the remote produced no usable response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
}

/// Port for the outbound HTTP client.
///
/// Implementations must not retry and must not log the request URL, which
/// carries the access token.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send one request and read its full body.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}
