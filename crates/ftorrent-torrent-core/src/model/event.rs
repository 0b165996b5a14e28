use std::path::PathBuf;

use super::{EngineHandle, InfoHash};

/// Structured event drained from the engine's queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The engine flagged a per-torrent error; the torrent may recover.
    TorrentError {
        /// Affected torrent.
        handle: EngineHandle,
        /// Content identifier.
        info_hash: InfoHash,
        /// Display name at the time of the error.
        name: String,
        /// Engine message.
        message: String,
    },
    /// A file could not be read or written.
    FileError {
        /// Affected torrent.
        handle: EngineHandle,
        /// Content identifier.
        info_hash: InfoHash,
        /// Path of the failing file.
        file: String,
        /// Engine message.
        message: String,
    },
    /// An add request was accepted and the torrent is live.
    AddConfirmed {
        /// New handle.
        handle: EngineHandle,
        /// Content identifier.
        info_hash: InfoHash,
    },
    /// An asynchronous add request failed; no torrent was created.
    AddFailed {
        /// Content identifier when known.
        info_hash: Option<InfoHash>,
        /// Engine message.
        message: String,
    },
    /// The info dictionary arrived for a magnet add.
    MetadataReceived {
        /// Affected torrent.
        handle: EngineHandle,
        /// Content identifier.
        info_hash: InfoHash,
    },
    /// Requested resume data is ready to persist.
    ResumeDataReady {
        /// Affected torrent.
        handle: EngineHandle,
        /// Content identifier.
        info_hash: InfoHash,
        /// Engine-serialized resume blob.
        payload: Vec<u8>,
    },
    /// Resume data could not be produced this time.
    ResumeDataFailed {
        /// Affected torrent.
        handle: EngineHandle,
        /// Content identifier.
        info_hash: InfoHash,
        /// Engine message.
        message: String,
    },
    /// A tracker announce failed.
    TrackerError {
        /// Affected torrent.
        handle: EngineHandle,
        /// Content identifier.
        info_hash: InfoHash,
        /// Tracker URL.
        url: String,
        /// Engine message.
        message: String,
    },
}

impl EngineEvent {
    /// Content identifier the event refers to, when it names one.
    #[must_use]
    pub const fn info_hash(&self) -> Option<InfoHash> {
        match self {
            Self::TorrentError { info_hash, .. }
            | Self::FileError { info_hash, .. }
            | Self::AddConfirmed { info_hash, .. }
            | Self::MetadataReceived { info_hash, .. }
            | Self::ResumeDataReady { info_hash, .. }
            | Self::ResumeDataFailed { info_hash, .. }
            | Self::TrackerError { info_hash, .. } => Some(*info_hash),
            Self::AddFailed { info_hash, .. } => *info_hash,
        }
    }
}

/// Decoded resume blob, ready to hand back to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeParams {
    /// Content identifier.
    pub info_hash: InfoHash,
    /// Display name, possibly empty for magnets without metadata.
    pub name: String,
    /// Download directory.
    pub save_path: PathBuf,
    /// Whether the torrent was paused when exported.
    pub paused: bool,
    /// Whether the engine queue managed the torrent when exported.
    pub auto_managed: bool,
    /// Engine-specific remainder of the blob.
    pub payload: Vec<u8>,
}

impl ResumeParams {
    /// Whether the torrent was paused by the user rather than by the engine queue.
    #[must_use]
    pub const fn explicitly_paused(&self) -> bool {
        self.paused && !self.auto_managed
    }
}
