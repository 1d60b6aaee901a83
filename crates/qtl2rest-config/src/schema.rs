//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use std::path::PathBuf;

use qtl2rest_telemetry::LogFormat;
use serde::{Deserialize, Serialize};

/// Server configuration section.
///
/// # Example
///
/// ```
/// use qtl2rest_config::ServerConfig;
///
/// let config = ServerConfig {
///     http_addr: "127.0.0.1:8001".to_string(),
///     workers: 4,
///     request_timeout_ms: 30_000,
///     shutdown_timeout_secs: 10,
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP server bind address (e.g., "0.0.0.0:8001").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Worker threads for the runtime; `0` keeps the runtime default.
    #[serde(default)]
    pub workers: usize,

    /// Per-request timeout in milliseconds; `0` disables it.
    #[serde(default)]
    pub request_timeout_ms: u64,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            workers: 0,
            request_timeout_ms: 0,
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8001".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Name written in the logger column.
    #[serde(default = "default_logger_name")]
    pub logger_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            logger_name: default_logger_name(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_logger_name() -> String {
    "qtl2rest".to_string()
}

/// Response compression section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CompressionConfig {
    /// Register the gzip middleware.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Gzip level, 0 through 9.
    #[serde(default = "default_compression_level")]
    pub level: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_compression_level(),
        }
    }
}

fn default_compression_level() -> u32 {
    6
}

/// Data section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    /// JSON snapshot of datasets, markers and identifiers.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}
