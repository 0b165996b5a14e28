//! # Design
//!
//! - Keep adapter failures local; callers see [`TorrentError`] values.
//! - Keep error messages constant; store operational context in fields.
//! - Provide helpers to build `TorrentError` with structured sources.

use std::error::Error;
use std::io;

use ftorrent_torrent_core::{InfoHash, TorrentError};
use thiserror::Error;

/// Internal error details raised by the engine adapter.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A runtime configuration value is unusable.
    #[error("invalid engine configuration")]
    InvalidConfig {
        /// Offending field.
        field: &'static str,
        /// Static reason describing the invalid value.
        reason: &'static str,
    },
    /// The peer listener could not be bound.
    #[error("failed to bind peer listener")]
    Bind {
        /// Requested endpoint.
        endpoint: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Resume data could not be encoded.
    #[error("failed to encode resume data")]
    ResumeEncode {
        /// Content identifier being exported.
        info_hash: InfoHash,
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Build a torrent error with structured operation context.
pub fn op_failed(
    operation: &'static str,
    info_hash: Option<InfoHash>,
    source: impl Error + Send + Sync + 'static,
) -> TorrentError {
    TorrentError::OperationFailed {
        operation,
        info_hash,
        source: Box::new(source),
    }
}
