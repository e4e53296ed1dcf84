//! `reqwest`-backed implementation of [`HttpTransport`].

use std::time::Duration;

use async_trait::async_trait;
use tracing::{Instrument, debug_span};

use crate::domain::ports::{
    HttpMethod, HttpTransport, TransportError, TransportRequest, TransportResponse,
};

/// Shared pooled HTTP client with a per-call timeout.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// # Errors
    /// Returns [`TransportError::Request`] when the TLS backend cannot be
    /// initialised.
    pub fn new(timeout: Duration, pool_max_idle_per_host: usize) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(pool_max_idle_per_host)
            .build()
            .map_err(|e| {
                TransportError::Request(format!("failed to create HTTP client: {e}"))
            })?;
        Ok(Self { client, timeout })
    }

    fn map_error(&self, error: &reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else if error.is_connect() {
            TransportError::Connect(error.to_string())
        } else {
            TransportError::Request(error.to_string())
        }
    }

    async fn read_body(
        &self,
        mut response: reqwest::Response,
        limit: Option<usize>,
    ) -> Result<Vec<u8>, TransportError> {
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.map_error(&e.without_url()))?
        {
            if let Some(limit) = limit {
                if body.len() + chunk.len() > limit {
                    return Err(TransportError::BodyTooLarge { limit });
                }
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let limit = request.max_body_bytes;
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(request.url),
            HttpMethod::Post => self.client.post(request.url),
        };
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        // Errors are stripped of their URL: it carries the access token.
        let response = builder
            .send()
            .instrument(debug_span!("http_request"))
            .await
            .map_err(|e| self.map_error(&e.without_url()))?;

        let status = response.status().as_u16();
        let body = self.read_body(response, limit).await?;
        tracing::debug!(status, bytes = body.len(), "HTTP response received");
        Ok(TransportResponse { status, body })
    }
}
