//! Error taxonomy for the Instagram gateway.
//!
//! Every failure that leaves the gateway is one of the [`GatewayError`]
//! variants. Callers that only need to branch on the kind of failure should
//! match on [`GatewayError::category`] rather than on the variant payloads.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error object carried inside the remote `{"error": {...}}` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    #[serde(default = "unknown_message")]
    pub message: String,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default, rename = "error_subcode")]
    pub subcode: Option<i64>,
}

fn unknown_message() -> String {
    "Unknown error".to_owned()
}

impl RemoteError {
    #[must_use]
    pub fn new(message: impl Into<String>, code: Option<i64>, subcode: Option<i64>) -> Self {
        Self {
            message: message.into(),
            code,
            subcode,
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        match (self.code, self.subcode) {
            (Some(code), Some(subcode)) => write!(f, " (code {code}, subcode {subcode})"),
            (Some(code), None) => write!(f, " (code {code})"),
            (None, Some(subcode)) => write!(f, " (subcode {subcode})"),
            (None, None) => Ok(()),
        }
    }
}

/// Fieldless view of the taxonomy, for logging and for front ends that
/// report the category next to the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Network,
    InvalidResponse,
    RemoteApi,
    RateLimited,
    PermissionAdvancedAccessRequired,
    Validation,
    Configuration,
}

impl ErrorCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::InvalidResponse => "invalid_response",
            Self::RemoteApi => "remote_api",
            Self::RateLimited => "rate_limited",
            Self::PermissionAdvancedAccessRequired => "permission_advanced_access_required",
            Self::Validation => "validation",
            Self::Configuration => "configuration",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified gateway failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Connect, DNS, TLS or timeout failure; the remote never answered.
    #[error("network error: {message}")]
    Network { message: String },

    /// The remote answered with a body that is not the expected JSON.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Structured remote failure with no more specific classification.
    #[error("remote API error: {error}")]
    RemoteApi { error: RemoteError },

    /// The remote service throttled the call (HTTP 429 or a throttling code).
    #[error("rate limited by remote API: {message}")]
    RateLimited {
        message: String,
        remote: Option<RemoteError>,
    },

    /// The operation needs an elevated permission tier on the remote app.
    #[error("{error}\n\n{remediation}")]
    PermissionAdvancedAccessRequired {
        error: RemoteError,
        remediation: String,
    },

    /// Client-side precondition failed; nothing was sent.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A required identifier or setting is absent.
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl GatewayError {
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn remote(error: RemoteError) -> Self {
        Self::RemoteApi { error }
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Network { .. } => ErrorCategory::Network,
            Self::InvalidResponse { .. } => ErrorCategory::InvalidResponse,
            Self::RemoteApi { .. } => ErrorCategory::RemoteApi,
            Self::RateLimited { .. } => ErrorCategory::RateLimited,
            Self::PermissionAdvancedAccessRequired { .. } => {
                ErrorCategory::PermissionAdvancedAccessRequired
            }
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Configuration { .. } => ErrorCategory::Configuration,
        }
    }

    /// The original remote error, when the failure came from an error envelope.
    #[must_use]
    pub fn remote_error(&self) -> Option<&RemoteError> {
        match self {
            Self::RemoteApi { error } | Self::PermissionAdvancedAccessRequired { error, .. } => {
                Some(error)
            }
            Self::RateLimited { remote, .. } => remote.as_ref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn remediation(&self) -> Option<&str> {
        match self {
            Self::PermissionAdvancedAccessRequired { remediation, .. } => Some(remediation),
            _ => None,
        }
    }

    /// Whether repeating the same call later could succeed.
    ///
    /// The gateway never retries on its own; this is a hint for callers.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::RateLimited { .. })
    }
}

/// Step of the publish workflow at which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishPhase {
    /// Local checks and the image aspect-ratio gate; nothing exists remotely.
    Precondition,
    /// Container creation; nothing exists remotely.
    Create,
    /// Container commit; the container exists remotely but is not published.
    Publish,
}

impl fmt::Display for PublishPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Precondition => "precondition",
            Self::Create => "create",
            Self::Publish => "publish",
        })
    }
}

/// Publish failure annotated with the phase it stopped in.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("publish failed in {phase} phase: {error}")]
pub struct PublishFailure {
    pub phase: PublishPhase,
    /// Set when the container was created before the failure.
    pub container_id: Option<String>,
    #[source]
    pub error: GatewayError,
}

impl PublishFailure {
    #[must_use]
    pub fn new(phase: PublishPhase, container_id: Option<String>, error: GatewayError) -> Self {
        Self {
            phase,
            container_id,
            error,
        }
    }

    /// True when only the commit step needs repeating: the container exists
    /// remotely and retrying from scratch would orphan it.
    #[must_use]
    pub fn commit_retry_possible(&self) -> bool {
        self.phase == PublishPhase::Publish && self.container_id.is_some()
    }
}

impl From<PublishFailure> for GatewayError {
    fn from(failure: PublishFailure) -> Self {
        failure.error
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn remote_error_parses_envelope_fields() {
        let err: RemoteError = serde_json::from_str(
            r#"{"message":"Invalid parameter","type":"OAuthException","code":100,"error_subcode":33,"fbtrace_id":"x"}"#,
        )
        .unwrap();
        assert_eq!(err.message, "Invalid parameter");
        assert_eq!(err.code, Some(100));
        assert_eq!(err.subcode, Some(33));
    }

    #[test]
    fn remote_error_without_message_uses_placeholder() {
        let err: RemoteError = serde_json::from_str(r#"{"code":1}"#).unwrap();
        assert_eq!(err.message, "Unknown error");
        assert_eq!(err.to_string(), "Unknown error (code 1)");
    }

    #[test]
    fn permission_error_display_keeps_original_message() {
        let err = GatewayError::PermissionAdvancedAccessRequired {
            error: RemoteError::new("temporarily unavailable", Some(2), None),
            remediation: "apply for advanced access".to_owned(),
        };
        let text = err.to_string();
        assert!(text.starts_with("temporarily unavailable (code 2)"));
        assert!(text.ends_with("apply for advanced access"));
        assert_eq!(err.remediation(), Some("apply for advanced access"));
        assert_eq!(err.remote_error().and_then(|e| e.code), Some(2));
    }

    #[test]
    fn categories_map_one_to_one() {
        assert_eq!(
            GatewayError::network("x").category(),
            ErrorCategory::Network
        );
        assert_eq!(
            GatewayError::invalid_response("x").category(),
            ErrorCategory::InvalidResponse
        );
        assert_eq!(
            GatewayError::validation("x").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            GatewayError::configuration("x").category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            GatewayError::remote(RemoteError::new("x", Some(100), None)).category(),
            ErrorCategory::RemoteApi
        );
    }

    #[test]
    fn publish_failure_commit_retry_hint() {
        let create = PublishFailure::new(PublishPhase::Create, None, GatewayError::network("x"));
        assert!(!create.commit_retry_possible());

        let commit = PublishFailure::new(
            PublishPhase::Publish,
            Some("1789".to_owned()),
            GatewayError::network("x"),
        );
        assert!(commit.commit_retry_possible());
        assert_eq!(GatewayError::from(commit).category(), ErrorCategory::Network);
    }
}
