//! Error types for resume-blob persistence.

use std::io;
use std::path::PathBuf;

use ftorrent_torrent_core::InfoHash;
use thiserror::Error;

/// Failures raised by a [`crate::PersistenceStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("resume store io failure")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// No blob exists for the identifier.
    #[error("resume blob not found")]
    NotFound {
        /// Missing identifier.
        info_hash: InfoHash,
    },
}

impl StoreError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;
