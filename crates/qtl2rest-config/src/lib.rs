//! Typed configuration for qtl2rest.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides (`QTL2REST__SECTION__KEY`)
//! - Strict validation (unknown fields are rejected)
//! - Layered loading (defaults, then file, then environment)
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8001"
//! workers = 0
//! request_timeout_ms = 0
//! shutdown_timeout_secs = 30
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "pipe"
//! logger_name = "qtl2rest"
//!
//! [compression]
//! enabled = true
//! level = 6
//!
//! [data]
//! snapshot_path = "data/snapshot.json"
//! ```

#![doc(html_root_url = "https://docs.rs/qtl2rest-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::Qtl2RestConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{CompressionConfig, DataConfig, LoggingConfig, ServerConfig};
pub use qtl2rest_telemetry::LogFormat;
