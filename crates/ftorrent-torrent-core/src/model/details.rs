use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Announce state of one tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerStatus {
    /// Last announce succeeded.
    Working,
    /// An announce is in flight.
    Updating,
    /// Not contacted yet.
    NotContacted,
    /// Last announce failed.
    Error,
}

impl TrackerStatus {
    /// Human-readable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Working => "Working",
            Self::Updating => "Updating",
            Self::NotContacted => "Not contacted",
            Self::Error => "Error",
        }
    }
}

/// One tracker attached to a torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerInfo {
    /// Announce URL.
    pub url: String,
    /// Tier index.
    pub tier: u8,
    /// Announce state.
    pub status: TrackerStatus,
    /// Last tracker message or error.
    pub message: String,
}

/// One connected peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerInfo {
    /// Remote endpoint.
    pub address: SocketAddr,
    /// Client identification string.
    pub client: String,
    /// Download rate from this peer in bytes per second.
    pub download_rate: u64,
    /// Upload rate to this peer in bytes per second.
    pub upload_rate: u64,
    /// Peer's own completion in `[0.0, 1.0]`.
    pub progress: f64,
    /// Connection flags in letter form (`I` incoming, `i`/`c`/`e`/`L` ...).
    pub flags: String,
}

/// One file within a torrent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Path relative to the save directory.
    pub path: String,
    /// File size in bytes.
    pub size: u64,
    /// Fraction downloaded in `[0.0, 1.0]`.
    pub progress: f64,
    /// Download priority (0 skips the file).
    pub priority: u8,
}

/// On-demand detail view of one torrent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TorrentDetails {
    /// Trackers in tier order.
    pub trackers: Vec<TrackerInfo>,
    /// Connected peers.
    pub peers: Vec<PeerInfo>,
    /// Files; empty until metadata is known.
    pub files: Vec<FileInfo>,
}
