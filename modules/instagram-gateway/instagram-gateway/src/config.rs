//! Gateway configuration.
//!
//! Layers, later wins: struct defaults, an optional YAML file, then
//! `INSTAGRAM_*` environment variables (`INSTAGRAM_ACCESS_TOKEN`,
//! `INSTAGRAM_CACHE_TTL_SECS`, ...).

use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Environment variable prefix for every configuration key.
pub const ENV_PREFIX: &str = "INSTAGRAM_";

const FIELDS: &[&str] = &[
    "access_token",
    "app_id",
    "business_account_id",
    "api_base_url",
    "api_version",
    "messaging_base_url",
    "rate_limit_requests_per_hour",
    "rate_limit_period_secs",
    "rate_limit_enable_backoff",
    "cache_enabled",
    "cache_ttl_secs",
    "request_timeout_ms",
    "pool_max_idle_per_host",
    "max_image_bytes",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration value for '{field}': {message}")]
    Invalid { field: &'static str, message: String },
}

impl ConfigError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Configuration for the Instagram gateway.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Long-lived access token sent with every call. Never logged.
    #[serde(deserialize_with = "deserialize_secret")]
    pub access_token: SecretString,
    /// Facebook app id, reported by rate-limit info.
    #[serde(deserialize_with = "deserialize_id")]
    pub app_id: Option<String>,
    /// Default Instagram business account for profile, media and publish calls.
    #[serde(deserialize_with = "deserialize_id")]
    pub business_account_id: Option<String>,
    /// Base URL of the resource host, without the version segment.
    pub api_base_url: String,
    /// Graph API version appended to `api_base_url`, e.g. `v19.0`.
    pub api_version: String,
    /// Versioned base URL of the messaging host.
    pub messaging_base_url: String,
    /// Client-side call budget per rate period.
    pub rate_limit_requests_per_hour: u32,
    /// Length of the trailing rate window in seconds.
    pub rate_limit_period_secs: u64,
    /// Reported through rate-limit info; the gateway itself never backs off.
    pub rate_limit_enable_backoff: bool,
    pub cache_enabled: bool,
    pub cache_ttl_secs: u64,
    /// Per-call timeout in milliseconds.
    pub request_timeout_ms: u64,
    pub pool_max_idle_per_host: usize,
    /// Largest image body the aspect-ratio check will download.
    pub max_image_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            access_token: SecretString::from(String::new()),
            app_id: None,
            business_account_id: None,
            api_base_url: "https://graph.facebook.com".to_owned(),
            api_version: "v19.0".to_owned(),
            messaging_base_url: "https://graph.facebook.com/v22.0".to_owned(),
            rate_limit_requests_per_hour: 200,
            rate_limit_period_secs: 3600,
            rate_limit_enable_backoff: true,
            cache_enabled: true,
            cache_ttl_secs: 300,
            request_timeout_ms: 30_000,
            pool_max_idle_per_host: 5,
            max_image_bytes: 10 * 1024 * 1024, // 10 MiB
        }
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

/// Numeric ids arrive as numbers from unquoted YAML and from the environment.
#[derive(Deserialize)]
#[serde(untagged)]
enum IdValue {
    Text(String),
    Number(u64),
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<IdValue>::deserialize(deserializer)?.map(|id| match id {
            IdValue::Text(text) => text,
            IdValue::Number(number) => number.to_string(),
        }),
    )
}

impl GatewayConfig {
    /// Configuration with the given token and defaults everywhere else.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::from(token.into()),
            ..Self::default()
        }
    }

    /// Build the layered figment: YAML file (when given) then environment.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).only(FIELDS))
    }

    /// Extract and validate a configuration from `figment`.
    ///
    /// # Errors
    /// Returns [`ConfigError::Load`] when a layer cannot be parsed and
    /// [`ConfigError::Invalid`] when a value fails validation.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the optional YAML file and the process environment.
    ///
    /// # Errors
    /// See [`GatewayConfig::from_figment`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment(path))
    }

    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token.expose_secret().trim().is_empty() {
            return Err(ConfigError::invalid("access_token", "must not be empty"));
        }
        if !self.api_version.starts_with('v') {
            return Err(ConfigError::invalid(
                "api_version",
                format!("'{}' must start with 'v'", self.api_version),
            ));
        }
        if self.rate_limit_requests_per_hour == 0 {
            return Err(ConfigError::invalid(
                "rate_limit_requests_per_hour",
                "must be greater than zero",
            ));
        }
        if self.rate_limit_period_secs == 0 {
            return Err(ConfigError::invalid(
                "rate_limit_period_secs",
                "must be greater than zero",
            ));
        }
        for (field, value) in [
            ("api_base_url", &self.api_base_url),
            ("messaging_base_url", &self.messaging_base_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| ConfigError::invalid(field, format!("'{value}': {e}")))?;
        }
        Ok(())
    }

    /// Versioned base URL of the resource host.
    #[must_use]
    pub fn resource_base_url(&self) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            self.api_version
        )
    }

    #[must_use]
    pub fn rate_period(&self) -> Duration {
        Duration::from_secs(self.rate_limit_period_secs)
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::io::Write;

    fn from_yaml(yaml: &str) -> Result<GatewayConfig, ConfigError> {
        GatewayConfig::from_figment(&Figment::new().merge(Yaml::string(yaml)))
    }

    #[test]
    fn defaults_apply_to_missing_fields() {
        let config = from_yaml("access_token: EAAtoken\n").unwrap();
        assert_eq!(config.access_token.expose_secret(), "EAAtoken");
        assert_eq!(config.rate_limit_requests_per_hour, 200);
        assert_eq!(config.rate_period(), Duration::from_secs(3600));
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.cache_enabled);
        assert!(config.business_account_id.is_none());
        assert_eq!(
            config.resource_base_url(),
            "https://graph.facebook.com/v19.0"
        );
    }

    #[test]
    fn yaml_overrides_defaults() {
        let config = from_yaml(
            "access_token: EAAtoken\nbusiness_account_id: \"17841400000\"\napi_base_url: https://graph.example.com/\napi_version: v21.0\ncache_enabled: false\n",
        )
        .unwrap();
        assert_eq!(config.business_account_id.as_deref(), Some("17841400000"));
        assert!(!config.cache_enabled);
        assert_eq!(
            config.resource_base_url(),
            "https://graph.example.com/v21.0"
        );
    }

    #[test]
    fn numeric_ids_are_read_as_strings() {
        let config = from_yaml("access_token: EAAtoken\napp_id: 123456\nbusiness_account_id: 17841400000\n")
            .unwrap();
        assert_eq!(config.app_id.as_deref(), Some("123456"));
        assert_eq!(config.business_account_id.as_deref(), Some("17841400000"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = from_yaml("access_token: EAAtoken\ncache_ttl: 5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn empty_token_is_rejected() {
        let err = from_yaml("cache_ttl_secs: 5\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "access_token",
                ..
            }
        ));
    }

    #[test]
    fn zero_budget_is_rejected() {
        let mut config = GatewayConfig::with_token("EAAtoken");
        config.rate_limit_requests_per_hour = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "rate_limit_requests_per_hour",
                ..
            })
        ));

        let mut config = GatewayConfig::with_token("EAAtoken");
        config.rate_limit_period_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "rate_limit_period_secs",
                ..
            })
        ));
    }

    #[test]
    fn version_must_start_with_v() {
        let mut config = GatewayConfig::with_token("EAAtoken");
        config.api_version = "19.0".to_owned();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "api_version",
                ..
            })
        ));
    }

    #[test]
    fn loads_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "access_token: EAAfile\nrate_limit_requests_per_hour: 50").unwrap();
        let figment = Figment::new().merge(Yaml::file(file.path()));
        let config = GatewayConfig::from_figment(&figment).unwrap();
        assert_eq!(config.rate_limit_requests_per_hour, 50);
    }
}
