//! Structured logging for qtl2rest.
//!
//! - [`init_logging`] installs the process-wide subscriber once at startup
//! - [`PipeFormat`] renders `timestamp|LEVEL|logger|pid|message` lines
//! - [`FlushingStdout`] flushes stdout after every line
//! - [`RequestLogger`] is the handle handlers use for their single
//!   per-request line

#![doc(html_root_url = "https://docs.rs/qtl2rest-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod format;
pub mod logging;
pub mod request_log;
pub mod testing;
pub mod writer;

pub use error::TelemetryError;
pub use format::PipeFormat;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};
pub use request_log::{RequestLogEntry, RequestLogger};
pub use writer::{FlushOnDrop, FlushingStdout};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
