//! Top-level configuration type.

use std::net::SocketAddr;
use std::time::Duration;

use qtl2rest_telemetry::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};

use crate::{CompressionConfig, ConfigError, DataConfig, LoggingConfig, ServerConfig};

/// Complete qtl2rest configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use qtl2rest_config::Qtl2RestConfig;
///
/// let config = Qtl2RestConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8001");
/// assert!(config.compression.enabled);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct Qtl2RestConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Response compression.
    #[serde(default)]
    pub compression: CompressionConfig,

    /// Data sources.
    #[serde(default)]
    pub data: DataConfig,
}

impl Qtl2RestConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - the server address is not a socket address
    /// - the compression level is above 9
    /// - the logger name is empty or contains `|`
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.compression.level > 9 {
            return Err(ConfigError::invalid_value(
                "compression.level",
                format!("must be between 0 and 9, got {}", self.compression.level),
            ));
        }

        if self.logging.logger_name.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "logging.logger_name",
                "must not be empty",
            ));
        }

        // The logger name is a column of pipe-delimited lines.
        if self.logging.logger_name.contains('|') {
            return Err(ConfigError::invalid_value(
                "logging.logger_name",
                "must not contain '|'",
            ));
        }

        Ok(())
    }

    /// Development preset: debug level, pretty logs, loopback address.
    ///
    /// ```
    /// use qtl2rest_config::Qtl2RestConfig;
    ///
    /// let config = Qtl2RestConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// assert!(config.validate().is_ok());
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.server.http_addr = "127.0.0.1:8001".to_string();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config
    }

    /// The parsed bind address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.http_addr.parse().map_err(|_| {
            ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            )
        })
    }

    /// The per-request timeout, if one is configured.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.server.request_timeout_ms > 0)
            .then(|| Duration::from_millis(self.server.request_timeout_ms))
    }

    /// The graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }

    /// Logging settings in the form `init_logging` expects.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.logging.enabled,
            level: self.logging.level.clone(),
            format: self.logging.format,
            logger_name: self.logging.logger_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = Qtl2RestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.socket_addr().unwrap().port(), 8001);
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_address() {
        let mut config = Qtl2RestConfig::default();
        config.server.http_addr = "not-an-address".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.http_addr"));
    }

    #[test]
    fn test_compression_level_bound() {
        let mut config = Qtl2RestConfig::default();
        config.compression.level = 9;
        assert!(config.validate().is_ok());

        config.compression.level = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_logger_name_rules() {
        let mut config = Qtl2RestConfig::default();
        config.logging.logger_name = "  ".to_string();
        assert!(config.validate().is_err());

        config.logging.logger_name = "qtl|2rest".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_request_timeout() {
        let mut config = Qtl2RestConfig::default();
        config.server.request_timeout_ms = 1500;
        assert_eq!(config.request_timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_log_config_mapping() {
        let mut config = Qtl2RestConfig::default();
        config.logging.logger_name = "qtl2api".to_string();
        config.logging.format = LogFormat::Json;

        let log = config.log_config();
        assert!(log.enabled);
        assert_eq!(log.level, "info");
        assert_eq!(log.format, LogFormat::Json);
        assert_eq!(log.logger_name, "qtl2api");
    }

    #[test]
    fn test_development_preset() {
        let config = Qtl2RestConfig::development();
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.server.http_addr, "127.0.0.1:8001");
    }
}
