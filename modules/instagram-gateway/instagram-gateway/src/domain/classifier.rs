//! Maps raw failures to the gateway error taxonomy.
//!
//! Pure and order-sensitive: the first matching rule wins. All message
//! matching lives here so the rules can change without touching dispatch.

use instagram_gateway_sdk::{GatewayError, RemoteError};

use super::request::PermissionMatch;

/// Remote codes the Graph API uses for throttling (app, user, page and
/// generic call-volume limits).
pub const THROTTLING_CODES: [i64; 4] = [4, 17, 32, 613];

/// Code the remote returns when a feature is unavailable to the app's
/// permission tier.
pub const PERMISSION_TIER_CODE: i64 = 2;

pub const ADVANCED_ACCESS_REMEDIATION: &str = "This error indicates that the \
instagram_manage_messages permission requires Advanced Access from Meta via App Review. \
Request Advanced Access for the permission in the Meta App Dashboard and retry once the \
review is approved.";

/// Raw failure observed by the dispatcher, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Connect, DNS, TLS or timeout failure.
    Transport(String),
    /// HTTP 429, with the error envelope when the body carried one.
    Throttled(Option<RemoteError>),
    /// Body that could not be parsed.
    Malformed(String),
    /// Error envelope parsed from the body.
    Remote(RemoteError),
}

#[must_use]
pub fn classify(failure: Failure, permission_match: PermissionMatch) -> GatewayError {
    match failure {
        Failure::Throttled(remote) => GatewayError::RateLimited {
            message: remote.as_ref().map_or_else(
                || "remote API rate limit exceeded (HTTP 429)".to_owned(),
                ToString::to_string,
            ),
            remote,
        },
        Failure::Remote(error) => classify_remote(error, permission_match),
        Failure::Transport(message) => GatewayError::network(message),
        Failure::Malformed(message) => GatewayError::invalid_response(message),
    }
}

fn classify_remote(error: RemoteError, permission_match: PermissionMatch) -> GatewayError {
    if error.code.is_some_and(|code| THROTTLING_CODES.contains(&code)) {
        return GatewayError::RateLimited {
            message: error.to_string(),
            remote: Some(error),
        };
    }
    if needs_advanced_access(&error, permission_match) {
        return GatewayError::PermissionAdvancedAccessRequired {
            error,
            remediation: ADVANCED_ACCESS_REMEDIATION.to_owned(),
        };
    }
    GatewayError::remote(error)
}

fn needs_advanced_access(error: &RemoteError, permission_match: PermissionMatch) -> bool {
    if error.code == Some(PERMISSION_TIER_CODE) {
        return true;
    }
    let message = error.message.to_lowercase();
    let keywords: &[&str] = match permission_match {
        PermissionMatch::Standard => &["unavailable", "temporarily"],
        PermissionMatch::Broad => &["unavailable", "temporarily", "permission", "access"],
    };
    keywords.iter().any(|keyword| message.contains(keyword))
}
