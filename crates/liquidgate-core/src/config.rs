//! Gateway configuration.
//!
//! Provides [`GatewayConfig`], loaded from environment variables with
//! defaults suitable for a local deployment.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{GatewayError, GatewayResult};

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parse a format name; anything other than `json` yields [`LogFormat::Text`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Liquidgate gateway configuration.
///
/// # Examples
///
/// ```
/// use liquidgate_core::GatewayConfig;
///
/// let config = GatewayConfig::default();
/// assert_eq!(config.gateway_listen, "0.0.0.0:8080");
/// assert_eq!(config.max_skew().as_secs(), 600);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Bind address for the gateway (e.g. `"0.0.0.0:8080"`).
    #[builder(default = String::from("0.0.0.0:8080"))]
    pub gateway_listen: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Log output format.
    #[builder(default)]
    pub log_format: LogFormat,

    /// Service name attached to every request span.
    #[builder(default = String::from("liquidgate"))]
    pub service_name: String,

    /// Replay window in milliseconds.
    #[builder(default = 600_000)]
    pub message_expiration_ms: u64,

    /// Largest request body buffered for verification, in bytes.
    #[builder(default = 1024 * 1024)]
    pub max_body_bytes: usize,

    /// Path of a JSON credential file: a partner-profile array, or the flat
    /// document exported from the secret store.
    #[builder(default)]
    pub credentials_file: Option<String>,

    /// Base URL of the partner-profile service.
    #[builder(default)]
    pub partner_profile_url: Option<String>,

    /// Seconds between two credential refreshes.
    #[builder(default = 15)]
    pub refresh_interval_secs: u64,

    /// Upstream URL that authenticated requests are forwarded to.
    #[builder(default)]
    pub upstream_url: Option<String>,

    /// Seconds before a forwarded request is abandoned.
    #[builder(default = 30)]
    pub upstream_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            gateway_listen: String::from("0.0.0.0:8080"),
            log_level: String::from("info"),
            log_format: LogFormat::Text,
            service_name: String::from("liquidgate"),
            message_expiration_ms: 600_000,
            max_body_bytes: 1024 * 1024,
            credentials_file: None,
            partner_profile_url: None,
            refresh_interval_secs: 15,
            upstream_url: None,
            upstream_timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_LISTEN` | `0.0.0.0:8080` |
    /// | `LOG_LEVEL` | `info` |
    /// | `LOG_FORMAT` | `text` |
    /// | `SERVICE_NAME` | `liquidgate` |
    /// | `MESSAGE_EXPIRATION_MSEC` | `600000` |
    /// | `MAX_BODY_BYTES` | `1048576` |
    /// | `CREDENTIALS_FILE` | *(unset)* |
    /// | `PARTNER_PROFILE_URL` | *(unset)* |
    /// | `REFRESH_ACQUIRERS_SECS` | `15` |
    /// | `UPSTREAM_URL` | *(unset)* |
    /// | `UPSTREAM_TIMEOUT_SECS` | `30` |
    ///
    /// Unparseable numeric values keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Ok(v) = std::env::var("LOG_FORMAT") {
            config.log_format = LogFormat::parse(&v);
        }
        if let Ok(v) = std::env::var("SERVICE_NAME") {
            config.service_name = v;
        }
        if let Ok(v) = std::env::var("MESSAGE_EXPIRATION_MSEC") {
            if let Ok(n) = v.parse::<u64>() {
                config.message_expiration_ms = n;
            }
        }
        if let Ok(v) = std::env::var("MAX_BODY_BYTES") {
            if let Ok(n) = v.parse::<usize>() {
                config.max_body_bytes = n;
            }
        }
        config.credentials_file = non_empty_var("CREDENTIALS_FILE");
        config.partner_profile_url = non_empty_var("PARTNER_PROFILE_URL");
        if let Ok(v) = std::env::var("REFRESH_ACQUIRERS_SECS") {
            if let Ok(n) = v.parse::<u64>() {
                config.refresh_interval_secs = n;
            }
        }
        config.upstream_url = non_empty_var("UPSTREAM_URL");
        if let Ok(v) = std::env::var("UPSTREAM_TIMEOUT_SECS") {
            if let Ok(n) = v.parse::<u64>() {
                config.upstream_timeout_secs = n;
            }
        }

        config
    }

    /// Maximum allowed distance between a signature timestamp and the
    /// verification time.
    #[must_use]
    pub fn max_skew(&self) -> Duration {
        Duration::from_millis(self.message_expiration_ms)
    }

    /// Interval between two credential refreshes.
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Time allowed for one forwarded request.
    #[must_use]
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// Check the configuration for values the gateway cannot run with.
    pub fn validate(&self) -> GatewayResult<()> {
        if self.message_expiration_ms == 0 {
            return Err(GatewayError::Config(
                "MESSAGE_EXPIRATION_MSEC must be greater than zero".to_owned(),
            ));
        }
        if self.refresh_interval_secs == 0 {
            return Err(GatewayError::Config(
                "REFRESH_ACQUIRERS_SECS must be greater than zero".to_owned(),
            ));
        }
        if self.max_body_bytes == 0 {
            return Err(GatewayError::Config(
                "MAX_BODY_BYTES must be greater than zero".to_owned(),
            ));
        }
        if self.upstream_timeout_secs == 0 {
            return Err(GatewayError::Config(
                "UPSTREAM_TIMEOUT_SECS must be greater than zero".to_owned(),
            ));
        }
        if self.credentials_file.is_none() && self.partner_profile_url.is_none() {
            return Err(GatewayError::Config(
                "one of CREDENTIALS_FILE or PARTNER_PROFILE_URL must be set".to_owned(),
            ));
        }
        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
