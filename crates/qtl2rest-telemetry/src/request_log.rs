//! Per-request log lines.
//!
//! Handlers emit exactly one line per request through a [`RequestLogger`]:
//!
//! - success: `INFO` with message `path|elapsedSeconds`
//! - failure: `ERROR` with message `path|k1=v1&k2=v2|errorMessage`

use std::sync::{Arc, Mutex, PoisonError};

use tracing::Level;

/// One request log record.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestLogEntry {
    /// The request produced a result.
    Success {
        /// Request path.
        path: String,
        /// Elapsed seconds.
        elapsed_secs: f64,
    },
    /// The request failed.
    Failure {
        /// Request path.
        path: String,
        /// Url-encoded parameters, in request order.
        params: String,
        /// Underlying error message.
        message: String,
    },
}

impl RequestLogEntry {
    /// Level the entry is logged at.
    #[must_use]
    pub fn level(&self) -> Level {
        match self {
            Self::Success { .. } => Level::INFO,
            Self::Failure { .. } => Level::ERROR,
        }
    }

    /// The message column of the log line.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Success { path, elapsed_secs } => format!("{path}|{elapsed_secs}"),
            Self::Failure {
                path,
                params,
                message,
            } => format!("{path}|{params}|{message}"),
        }
    }
}

/// Handle used by handlers to write their single log line.
///
/// Cloning is cheap. A logger built with [`RequestLogger::recording`] also
/// keeps every entry in memory so callers can inspect what was logged.
#[derive(Debug, Clone, Default)]
pub struct RequestLogger {
    recorded: Option<Arc<Mutex<Vec<RequestLogEntry>>>>,
}

impl RequestLogger {
    /// Creates a logger that writes through `tracing`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a logger that also records entries in memory.
    #[must_use]
    pub fn recording() -> Self {
        Self {
            recorded: Some(Arc::default()),
        }
    }

    /// Logs a successful request.
    pub fn success(&self, path: &str, elapsed_secs: f64) {
        self.log(RequestLogEntry::Success {
            path: path.to_string(),
            elapsed_secs,
        });
    }

    /// Logs a failed request.
    pub fn failure(&self, path: &str, params: &str, message: &str) {
        self.log(RequestLogEntry::Failure {
            path: path.to_string(),
            params: params.to_string(),
            message: message.to_string(),
        });
    }

    /// Entries recorded so far; empty unless built with [`recording`](Self::recording).
    #[must_use]
    pub fn entries(&self) -> Vec<RequestLogEntry> {
        self.recorded.as_ref().map_or_else(Vec::new, |recorded| {
            recorded
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        })
    }

    fn log(&self, entry: RequestLogEntry) {
        let message = entry.message();
        if entry.level() == Level::ERROR {
            tracing::error!("{message}");
        } else {
            tracing::info!("{message}");
        }

        if let Some(recorded) = &self.recorded {
            recorded
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(entry);
        }
    }
}
