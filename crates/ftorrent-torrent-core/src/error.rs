//! Error types for torrent commands.
//!
//! # Design
//! - Messages are constant; context lives in structured fields so callers can
//!   log them without string parsing.
//! - Engine-reported per-torrent failures are not errors here; they travel as
//!   [`crate::EngineEvent`] values and surface through notifications.

use std::error::Error;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::{EngineHandle, InfoHash};

/// Primary error type for torrent commands.
#[derive(Debug, Error)]
pub enum TorrentError {
    /// The session has not been initialised, or has been shut down.
    #[error("torrent session not initialized")]
    NotInitialized,
    /// The torrent file could not be read or parsed as metadata.
    #[error("invalid torrent source")]
    InvalidSource {
        /// Path supplied by the caller.
        path: PathBuf,
        /// Parser or I/O failure description.
        reason: String,
    },
    /// The magnet URI is malformed.
    #[error("invalid magnet uri")]
    InvalidMagnetUri {
        /// Why the URI was rejected.
        reason: String,
    },
    /// A torrent with the same content identifier is already present.
    #[error("torrent already present")]
    DuplicateTorrent {
        /// Identifier of the existing torrent.
        info_hash: InfoHash,
    },
    /// No tracked torrent has this identifier.
    #[error("torrent not found")]
    NotFound {
        /// Identifier that failed to resolve.
        info_hash: InfoHash,
    },
    /// The engine no longer recognises the handle.
    #[error("engine handle is no longer valid")]
    InvalidHandle {
        /// Stale handle.
        handle: EngineHandle,
    },
    /// The engine session could not be constructed.
    #[error("torrent session failed to start")]
    SessionStartup {
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// Resume data could not be produced or decoded.
    #[error("resume data rejected")]
    ResumeData {
        /// Operation identifier.
        operation: &'static str,
        /// Decoder failure description.
        reason: String,
    },
    /// Operation is not supported by the underlying engine.
    #[error("torrent operation not supported")]
    Unsupported {
        /// Operation identifier.
        operation: &'static str,
    },
    /// Operation failed in the underlying engine.
    #[error("torrent operation failed")]
    OperationFailed {
        /// Operation identifier.
        operation: &'static str,
        /// Torrent identifier when available.
        info_hash: Option<InfoHash>,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl TorrentError {
    /// Construct a startup failure from any error source.
    pub fn startup(source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::SessionStartup {
            source: source.into(),
        }
    }

    /// Whether the error was a synchronous command rejection with no side effects.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::NotInitialized
                | Self::InvalidSource { .. }
                | Self::InvalidMagnetUri { .. }
                | Self::DuplicateTorrent { .. }
        )
    }
}

/// Convenience alias for torrent operation results.
pub type TorrentResult<T> = Result<T, TorrentError>;
