//! Snapshot loading errors.

use std::path::PathBuf;

use thiserror::Error;

/// Error raised while loading a dataset snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// The snapshot file could not be read.
    #[error("failed to read snapshot '{path}': {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The snapshot is not valid JSON of the expected shape.
    #[error("invalid snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two datasets share an id.
    #[error("duplicate dataset id '{0}' in snapshot")]
    DuplicateDataset(String),
}

impl SnapshotError {
    /// Creates a read error.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }
}
