//! Executes logical requests against the resource and messaging hosts.
//!
//! Order per call: cache lookup (cacheable reads only), rate admission, HTTP
//! call, classification, cache store. Nothing is retried here.

use std::sync::Arc;
use std::time::Duration;

use instagram_gateway_sdk::{GatewayError, RemoteError};
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;
use url::Url;

use super::cache::CacheStore;
use super::classifier::{Failure, classify};
use super::ports::{HttpTransport, TransportRequest, TransportResponse};
use super::rate_limiter::RateLimiter;
use super::request::{ACCESS_TOKEN_PARAM, ApiRequest, Host, Method};
use crate::config::GatewayConfig;

pub struct Dispatcher {
    transport: Arc<dyn HttpTransport>,
    limiter: RateLimiter,
    cache: CacheStore,
    cache_ttl: Duration,
    resource_base: String,
    messaging_base: String,
    access_token: SecretString,
}

impl Dispatcher {
    #[must_use]
    pub fn new(config: &GatewayConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            limiter: RateLimiter::new(config.rate_limit_requests_per_hour, config.rate_period()),
            cache: CacheStore::new(config.cache_enabled),
            cache_ttl: config.cache_ttl(),
            resource_base: config.resource_base_url(),
            messaging_base: config.messaging_base_url.trim_end_matches('/').to_owned(),
            access_token: SecretString::from(config.access_token.expose_secret().to_owned()),
        }
    }

    #[must_use]
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    #[must_use]
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Run one logical request and return the parsed success payload.
    ///
    /// # Errors
    /// Any failure, already classified into the gateway taxonomy.
    #[instrument(
        name = "instagram.dispatch",
        skip_all,
        fields(endpoint = request.path(), host = request.host().as_str())
    )]
    pub async fn dispatch(&self, request: &ApiRequest) -> Result<serde_json::Value, GatewayError> {
        let cache_key = request.is_cacheable().then(|| request.cache_key());
        if let Some(key) = cache_key.as_deref() {
            if let Some(value) = self.cache.get(key) {
                tracing::debug!(cache_key = key, "Cache hit");
                return Ok(value);
            }
        }

        let url = self.build_url(request)?;
        self.limiter.acquire().await;

        let outbound = match request.method() {
            Method::Read => TransportRequest::get(url),
            Method::Write => TransportRequest::post(url, request.body().cloned()),
        };

        tracing::debug!("Sending request");
        let response = self.transport.send(outbound).await.map_err(|e| {
            tracing::error!(error = %e, "HTTP request failed");
            classify(Failure::Transport(e.to_string()), request.permission_match())
        })?;

        let body = Self::interpret(&response).map_err(|failure| {
            let err = classify(failure, request.permission_match());
            tracing::warn!(
                status = response.status,
                category = %err.category(),
                error_code = err.remote_error().and_then(|e| e.code),
                error_subcode = err.remote_error().and_then(|e| e.subcode),
                error = %err,
                "Remote call failed"
            );
            err
        })?;

        if let Some(key) = cache_key {
            self.cache.put(key, body.clone(), self.cache_ttl);
        }
        tracing::debug!(status = response.status, "Request succeeded");
        Ok(body)
    }

    /// Turn a raw response into a payload or an unclassified failure.
    fn interpret(response: &TransportResponse) -> Result<serde_json::Value, Failure> {
        if response.status == 429 {
            let remote = serde_json::from_slice::<serde_json::Value>(&response.body)
                .ok()
                .and_then(|body| body.get("error").map(remote_error_from));
            return Err(Failure::Throttled(remote));
        }

        let body: serde_json::Value = serde_json::from_slice(&response.body).map_err(|e| {
            Failure::Malformed(format!(
                "invalid JSON response (HTTP {}): {e}",
                response.status
            ))
        })?;

        if let Some(envelope) = body.get("error") {
            return Err(Failure::Remote(remote_error_from(envelope)));
        }
        if !response.is_success() {
            return Err(Failure::Remote(RemoteError::new(
                format!("unexpected HTTP status {}", response.status),
                None,
                None,
            )));
        }
        Ok(body)
    }

    fn build_url(&self, request: &ApiRequest) -> Result<Url, GatewayError> {
        if let Some(segment) = request
            .segments()
            .iter()
            .find(|segment| matches!(segment.as_str(), "" | "." | ".."))
        {
            return Err(GatewayError::validation(format!(
                "invalid path segment '{segment}' in endpoint '{}'",
                request.path()
            )));
        }

        let base = match request.host() {
            Host::Resource => &self.resource_base,
            Host::Messaging => &self.messaging_base,
        };
        let mut url = Url::parse(base).map_err(|e| {
            GatewayError::configuration(format!("invalid base URL '{base}': {e}"))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                GatewayError::configuration(format!("base URL '{base}' cannot carry a path"))
            })?
            .pop_if_empty()
            .extend(request.segments());
        url.query_pairs_mut()
            .extend_pairs(request.params())
            .append_pair(ACCESS_TOKEN_PARAM, self.access_token.expose_secret());
        Ok(url)
    }
}

fn remote_error_from(envelope: &serde_json::Value) -> RemoteError {
    serde_json::from_value(envelope.clone()).unwrap_or_else(|_| {
        let message = envelope
            .as_str()
            .map_or_else(|| envelope.to_string(), str::to_owned);
        RemoteError::new(message, None, None)
    })
}
