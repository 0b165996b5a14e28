use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::InfoHash;

/// Engine-level activity reported alongside the status flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineActivity {
    /// Waiting for a check slot, or for scheduling before metadata exists.
    QueuedForChecking,
    /// Hashing pieces already on disk.
    CheckingFiles,
    /// Fetching the info dictionary from peers (magnet adds).
    DownloadingMetadata,
    /// Transferring payload.
    Downloading,
    /// All wanted pieces are present; not uploading.
    Finished,
    /// Uploading after completion.
    Seeding,
    /// Validating fast-resume data.
    CheckingResumeData,
}

/// Fixed-shape point-in-time status of one torrent, as reported by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    /// Content identifier.
    pub info_hash: InfoHash,
    /// Display name; empty until metadata arrives.
    pub name: String,
    /// Download directory.
    pub save_path: PathBuf,
    /// Bytes selected for download.
    pub total_wanted: u64,
    /// Selected bytes already verified.
    pub total_wanted_done: u64,
    /// Payload bytes uploaded over the torrent's lifetime.
    pub total_uploaded: u64,
    /// Fraction complete, as the engine reports it (may briefly exceed bounds).
    pub progress: f64,
    /// Payload download rate in bytes per second.
    pub download_rate: u64,
    /// Payload upload rate in bytes per second.
    pub upload_rate: u64,
    /// Connected peers.
    pub num_peers: u32,
    /// Connected peers that are seeds.
    pub num_seeds: u32,
    /// When the torrent was first added.
    pub added_at: DateTime<Utc>,
    /// When the torrent first reached completion.
    pub completed_at: Option<DateTime<Utc>>,
    /// Engine activity.
    pub activity: EngineActivity,
    /// Explicit pause flag.
    pub paused: bool,
    /// Whether the engine's own queue may start or stop this torrent.
    pub auto_managed: bool,
    /// Engine error message, if the torrent is in an error state.
    pub error: Option<String>,
    /// Whether the info dictionary is known.
    pub has_metadata: bool,
}
