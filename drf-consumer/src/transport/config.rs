//! HTTP transport configuration.
//!
//! TOML-deserializable settings for [`HttpTransport`](super::HttpTransport),
//! usually embedded as the `[http]` table of a node configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConsumerError, Result};

/// HTTP transport configuration.
///
/// Supports both HTTP/1.1 and HTTP/2 via reqwest.
///
/// # Examples
///
/// ```toml
/// [http]
/// pool_max_idle_per_host = 10
/// timeout_secs = 15
/// http_version = "http2"
/// user_agent = "inventory-sync/2.1"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Maximum idle connections per host.
    #[serde(default = "default_pool_max_idle")]
    pub pool_max_idle_per_host: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// HTTP version preference.
    #[serde(default)]
    pub http_version: HttpVersion,

    /// `User-Agent` header sent with every request.
    #[serde(default = "HttpConfig::default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: default_pool_max_idle(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            http_version: HttpVersion::default(),
            user_agent: Self::default_user_agent(),
        }
    }
}

impl HttpConfig {
    /// `drf-consumer/<version>`.
    #[must_use]
    pub fn default_user_agent() -> String {
        format!("drf-consumer/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Validates configuration values are within acceptable bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::ConfigError`] if:
    /// - `timeout_secs` is outside 1-300 seconds
    /// - `connect_timeout_secs` is outside 1-60 seconds
    /// - `user_agent` is empty or contains control characters
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ConsumerError::ConfigError(
                "timeout_secs must be between 1 and 300".to_owned(),
            ));
        }
        if self.connect_timeout_secs == 0 || self.connect_timeout_secs > 60 {
            return Err(ConsumerError::ConfigError(
                "connect_timeout_secs must be between 1 and 60".to_owned(),
            ));
        }
        if self.user_agent.is_empty() || self.user_agent.chars().any(char::is_control) {
            return Err(ConsumerError::ConfigError(
                "user_agent must be non-empty printable text".to_owned(),
            ));
        }
        Ok(())
    }

    /// Returns timeout as Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns connect timeout as Duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// HTTP version preference.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HttpVersion {
    /// HTTP/1.1 only.
    Http1,
    /// HTTP/2 only (requires prior knowledge).
    Http2,
    /// Auto-negotiate (prefer HTTP/2, fall back to HTTP/1.1).
    #[default]
    Auto,
}

const fn default_pool_max_idle() -> usize {
    100
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_config_default() {
        let config = HttpConfig::default();
        assert_eq!(config.pool_max_idle_per_host, 100);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.http_version, HttpVersion::Auto);
        assert!(config.user_agent.starts_with("drf-consumer/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_http_config_from_toml() {
        let toml = r#"
            pool_max_idle_per_host = 20
            timeout_secs = 45
            http_version = "http2"
            user_agent = "inventory-sync/2.1"
        "#;

        let config: HttpConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.pool_max_idle_per_host, 20);
        assert_eq!(config.timeout_secs, 45);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.http_version, HttpVersion::Http2);
        assert_eq!(config.user_agent, "inventory-sync/2.1");
    }

    #[test]
    fn test_http_config_empty_toml() {
        let config: HttpConfig = toml::from_str("").unwrap();
        assert_eq!(config.pool_max_idle_per_host, 100);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.http_version, HttpVersion::Auto);
    }

    #[test]
    fn test_http_version_invalid_value() {
        let result: std::result::Result<HttpConfig, _> = toml::from_str("http_version = \"http3\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_http_config_validate_bounds() {
        let ok = HttpConfig { timeout_secs: 300, connect_timeout_secs: 60, ..Default::default() };
        assert!(ok.validate().is_ok());

        let too_long = HttpConfig { timeout_secs: 301, ..Default::default() };
        assert!(matches!(too_long.validate().unwrap_err(), ConsumerError::ConfigError(_)));

        let zero_connect = HttpConfig { connect_timeout_secs: 0, ..Default::default() };
        assert!(zero_connect.validate().is_err());
    }

    #[test]
    fn test_http_config_validate_user_agent() {
        let empty = HttpConfig { user_agent: String::new(), ..Default::default() };
        assert!(empty.validate().is_err());

        let injected = HttpConfig { user_agent: "x\r\nEvil: 1".to_owned(), ..Default::default() };
        assert!(injected.validate().is_err());
    }
}
