//! Engine session abstraction.
//!
//! # Design
//! - [`EngineSession`] is the black-box engine surface: commands, point-in-time
//!   queries and a drained event queue. It never blocks on network I/O.
//! - Implementations own their torrents; handles are non-owning references.

use std::path::PathBuf;

use ftorrent_torrent_core::{
    EngineEvent, EngineHandle, EngineStatus, FileInfo, PeerInfo, ResumeParams, TorrentResult,
    TrackerInfo,
};

use crate::magnet::MagnetLink;
use crate::metainfo::Metainfo;
use crate::types::MemoryProfile;

mod memory;

pub use memory::{MemoryEngine, TransferSample};

/// Where a new torrent comes from.
#[derive(Debug, Clone)]
pub enum AddSource {
    /// Parsed `.torrent` metainfo.
    Metainfo(Metainfo),
    /// Parsed magnet link; metadata arrives later.
    Magnet(MagnetLink),
}

impl AddSource {
    /// Content identifier of the source.
    #[must_use]
    pub const fn info_hash(&self) -> ftorrent_torrent_core::InfoHash {
        match self {
            Self::Metainfo(metainfo) => metainfo.info_hash,
            Self::Magnet(link) => link.info_hash,
        }
    }
}

/// Parameters for admitting a torrent.
#[derive(Debug, Clone)]
pub struct AddTorrentParams {
    /// Torrent source.
    pub source: AddSource,
    /// Download directory.
    pub save_path: PathBuf,
    /// Start paused.
    pub paused: bool,
    /// Let the engine queue manage start/stop.
    pub auto_managed: bool,
}

impl AddTorrentParams {
    /// Auto-managed, unpaused admission; duplicates are rejected by the engine.
    #[must_use]
    pub fn new(source: AddSource, save_path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            save_path: save_path.into(),
            paused: false,
            auto_managed: true,
        }
    }
}

/// Command and query surface of one engine session.
pub trait EngineSession: Send {
    /// Admit a torrent; fails with `DuplicateTorrent` if it is already live.
    ///
    /// # Errors
    ///
    /// Returns an error when the engine rejects the torrent.
    fn add_torrent(&mut self, params: AddTorrentParams) -> TorrentResult<EngineHandle>;

    /// Re-admit a torrent from decoded resume data.
    ///
    /// # Errors
    ///
    /// Returns an error when the payload is unusable or the torrent is live.
    fn add_resumed(&mut self, params: ResumeParams) -> TorrentResult<EngineHandle>;

    /// Drop a torrent, optionally deleting its downloaded data.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` when the handle is not live.
    fn remove(&mut self, handle: EngineHandle, delete_files: bool) -> TorrentResult<()>;

    /// Set or clear the pause flag.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` when the handle is not live.
    fn set_paused(&mut self, handle: EngineHandle, paused: bool) -> TorrentResult<()>;

    /// Set or clear the auto-managed flag.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` when the handle is not live.
    fn set_auto_managed(&mut self, handle: EngineHandle, auto_managed: bool)
    -> TorrentResult<()>;

    /// Apply session-wide limits in bytes per second (`0` = unlimited).
    fn set_rate_limits(&mut self, download_bps: u64, upload_bps: u64);

    /// Apply a memory preset.
    fn apply_memory_profile(&mut self, profile: MemoryProfile);

    /// Live handles, the engine's source of truth.
    fn handles(&self) -> Vec<EngineHandle>;

    /// Point-in-time status.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` when the handle is not live.
    fn status(&self, handle: EngineHandle) -> TorrentResult<EngineStatus>;

    /// Pop every queued event.
    fn pop_events(&mut self) -> Vec<EngineEvent>;

    /// Ask for resume data; the result arrives as an event.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` when the handle is not live.
    fn request_resume_data(&mut self, handle: EngineHandle) -> TorrentResult<()>;

    /// Serialize resume data synchronously.
    ///
    /// # Errors
    ///
    /// Returns an error when the handle is not live or encoding fails.
    fn export_resume_state(&self, handle: EngineHandle) -> TorrentResult<Vec<u8>>;

    /// Decode a resume blob without admitting it.
    ///
    /// # Errors
    ///
    /// Returns `ResumeData` when the blob cannot be decoded.
    fn import_resume_state(&self, bytes: &[u8]) -> TorrentResult<ResumeParams>;

    /// Trackers attached to a torrent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` when the handle is not live.
    fn trackers(&self, handle: EngineHandle) -> TorrentResult<Vec<TrackerInfo>>;

    /// Connected peers.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` when the handle is not live.
    fn peers(&self, handle: EngineHandle) -> TorrentResult<Vec<PeerInfo>>;

    /// Files with per-file progress.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` when the handle is not live.
    fn files(&self, handle: EngineHandle) -> TorrentResult<Vec<FileInfo>>;

    /// Append trackers, skipping ones already attached.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` when the handle is not live.
    fn add_trackers(&mut self, handle: EngineHandle, urls: &[String]) -> TorrentResult<()>;
}
