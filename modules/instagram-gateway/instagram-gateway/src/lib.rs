#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Instagram Graph API gateway
//!
//! Client-side gateway to the Instagram Graph API. Every call goes through
//! one pipeline:
//!
//! ```text
//!   operation (profile, media, insights, publish, conversations, messages)
//!        |
//!        v
//!   Dispatcher --> TTL cache (cacheable reads) --> rolling-window limiter
//!        |
//!        v
//!   HttpTransport (reqwest) --> resource host | messaging host
//!        |
//!        v
//!   error classifier --> GatewayError
//! ```
//!
//! Publishing adds an image aspect-ratio check and runs as two remote steps
//! (container create, then commit). Nothing is retried inside the gateway.
//!
//! ## Usage
//!
//! ```ignore
//! let config = GatewayConfig::load(Some(Path::new("instagram.yaml")))?;
//! let gateway = InstagramGateway::from_config(&config)?;
//! let profile = gateway.client().get_profile(None).await?;
//! ```

#![forbid(unsafe_code)]

use std::sync::Arc;

pub use instagram_gateway_sdk::{
    ErrorCategory, GatewayError, InstagramGatewayApi, PublishFailure, PublishPhase, RemoteError,
};

pub mod config;
pub mod local_client;

#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;

#[cfg(test)]
mod test_support;

pub use config::{ConfigError, GatewayConfig};
pub use local_client::InstagramGatewayLocalClient;

use domain::ports::{HttpTransport, TransportError};
use domain::service::Service;
use infra::http::ReqwestTransport;

/// A configured gateway instance. Owns its limiter and cache; clone the
/// client handle to share it across tasks.
pub struct InstagramGateway {
    service: Arc<Service>,
    client: Arc<InstagramGatewayLocalClient>,
}

impl InstagramGateway {
    /// Build a gateway over the `reqwest` transport.
    ///
    /// # Errors
    /// Returns [`TransportError`] when the HTTP client cannot be created.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(config.request_timeout(), config.pool_max_idle_per_host)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Build a gateway over any transport implementation.
    #[must_use]
    pub fn with_transport(config: &GatewayConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let service = Arc::new(Service::new(config, transport));
        tracing::info!(
            api_version = %config.api_version,
            cache_enabled = config.cache_enabled,
            rate_limit = config.rate_limit_requests_per_hour,
            "Instagram gateway initialized"
        );
        Self {
            client: Arc::new(InstagramGatewayLocalClient::new(Arc::clone(&service))),
            service,
        }
    }

    #[must_use]
    pub fn client(&self) -> Arc<dyn InstagramGatewayApi> {
        Arc::clone(&self.client) as Arc<dyn InstagramGatewayApi>
    }

    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }
}
