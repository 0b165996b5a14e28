use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EngineActivity, EngineHandle, EngineStatus, InfoHash};

/// Ratio reported when something was uploaded but nothing downloaded.
pub const RATIO_INFINITE: f64 = 999.0;

/// Observable lifecycle state, derived from engine status flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorrentState {
    /// Waiting to start (magnet without metadata, or not yet scheduled).
    Queued,
    /// Verifying on-disk data or resume data.
    Checking,
    /// Transferring payload or metadata.
    Downloading,
    /// Uploading after completion.
    Seeding,
    /// Explicitly paused.
    Paused,
    /// The engine flagged an error.
    Error,
    /// Downloading state with every wanted byte present.
    Complete,
}

impl TorrentState {
    /// Derive the state from a fixed-shape engine status.
    ///
    /// The pause flag wins over everything else, then the error flag, then
    /// the engine activity.
    #[must_use]
    pub fn from_status(status: &EngineStatus) -> Self {
        if status.paused {
            return Self::Paused;
        }
        if status.error.is_some() {
            return Self::Error;
        }
        match status.activity {
            EngineActivity::QueuedForChecking if !status.has_metadata => Self::Queued,
            EngineActivity::QueuedForChecking
            | EngineActivity::CheckingFiles
            | EngineActivity::CheckingResumeData => Self::Checking,
            EngineActivity::DownloadingMetadata => Self::Downloading,
            EngineActivity::Downloading if status.progress >= 1.0 => Self::Complete,
            EngineActivity::Downloading => Self::Downloading,
            EngineActivity::Finished | EngineActivity::Seeding => Self::Seeding,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::Checking => "Checking",
            Self::Downloading => "Downloading",
            Self::Seeding => "Seeding",
            Self::Paused => "Paused",
            Self::Error => "Error",
            Self::Complete => "Complete",
        }
    }

    /// Whether the torrent counts towards the active total.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Downloading | Self::Seeding)
    }
}

impl fmt::Display for TorrentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot of one tracked torrent, refreshed once per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentRecord {
    /// Content identifier and primary key.
    pub id: InfoHash,
    /// Engine back-reference; the engine owns the torrent.
    pub handle: EngineHandle,
    /// Display name; empty until metadata arrives for magnets.
    pub name: String,
    /// Download directory.
    pub save_path: PathBuf,
    /// Bytes selected for download.
    pub total_size: u64,
    /// Selected bytes already downloaded and verified.
    pub downloaded_bytes: u64,
    /// Bytes uploaded.
    pub uploaded_bytes: u64,
    /// Fraction complete in `[0.0, 1.0]`.
    pub progress: f64,
    /// Download rate in bytes per second.
    pub download_rate: u64,
    /// Upload rate in bytes per second.
    pub upload_rate: u64,
    /// Connected peers.
    pub num_peers: u32,
    /// Connected seeds.
    pub num_seeds: u32,
    /// When the torrent was added.
    pub added_at: DateTime<Utc>,
    /// When progress first reached 1.0.
    pub completed_at: Option<DateTime<Utc>>,
    /// Derived lifecycle state.
    pub state: TorrentState,
    /// Engine error message while in [`TorrentState::Error`].
    pub error: Option<String>,
    /// Whether the info dictionary is known (resume data can be exported).
    pub has_metadata: bool,
}

impl TorrentRecord {
    /// Build a new record from the first status observed for a handle.
    #[must_use]
    pub fn from_status(handle: EngineHandle, status: &EngineStatus) -> Self {
        let mut record = Self {
            id: status.info_hash,
            handle,
            name: String::new(),
            save_path: PathBuf::new(),
            total_size: 0,
            downloaded_bytes: 0,
            uploaded_bytes: 0,
            progress: 0.0,
            download_rate: 0,
            upload_rate: 0,
            num_peers: 0,
            num_seeds: 0,
            added_at: status.added_at,
            completed_at: None,
            state: TorrentState::Queued,
            error: None,
            has_metadata: false,
        };
        record.refresh(status, Utc::now());
        record
    }

    /// Copy every cached field from a fresh engine status.
    pub fn refresh(&mut self, status: &EngineStatus, now: DateTime<Utc>) {
        self.name.clone_from(&status.name);
        self.save_path.clone_from(&status.save_path);
        self.total_size = status.total_wanted;
        self.downloaded_bytes = status.total_wanted_done;
        self.uploaded_bytes = status.total_uploaded;
        self.progress = clamp_progress(status.progress);
        self.download_rate = status.download_rate;
        self.upload_rate = status.upload_rate;
        self.num_peers = status.num_peers;
        self.num_seeds = status.num_seeds;
        self.added_at = status.added_at;
        self.state = TorrentState::from_status(status);
        self.error.clone_from(&status.error);
        self.has_metadata = status.has_metadata;
        if self.progress >= 1.0 && self.completed_at.is_none() {
            self.completed_at = Some(status.completed_at.unwrap_or(now));
        }
    }

    /// Seconds until completion; `None` when not downloading or stalled.
    #[must_use]
    pub const fn eta(&self) -> Option<u64> {
        if !matches!(self.state, TorrentState::Downloading) || self.download_rate == 0 {
            return None;
        }
        let remaining = self.total_size.saturating_sub(self.downloaded_bytes);
        Some(remaining / self.download_rate)
    }

    /// Upload/download ratio with [`RATIO_INFINITE`] when nothing was downloaded.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.downloaded_bytes == 0 {
            return if self.uploaded_bytes > 0 {
                RATIO_INFINITE
            } else {
                0.0
            };
        }
        to_f64(self.uploaded_bytes) / to_f64(self.downloaded_bytes)
    }

    /// Whether the record counts towards the active total.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.state.is_active()
    }
}

fn clamp_progress(progress: f64) -> f64 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "byte counters only feed a display ratio"
)]
const fn to_f64(value: u64) -> f64 {
    value as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(activity: EngineActivity) -> EngineStatus {
        EngineStatus {
            info_hash: InfoHash::from_bytes([7; 20]),
            name: "ubuntu.iso".into(),
            save_path: PathBuf::from("/downloads"),
            total_wanted: 1_000,
            total_wanted_done: 250,
            total_uploaded: 0,
            progress: 0.25,
            download_rate: 50,
            upload_rate: 0,
            num_peers: 3,
            num_seeds: 1,
            added_at: Utc::now(),
            completed_at: None,
            activity,
            paused: false,
            auto_managed: true,
            error: None,
            has_metadata: true,
        }
    }

    #[test]
    fn pause_flag_wins_over_activity_and_error() {
        let mut paused = status(EngineActivity::Seeding);
        paused.paused = true;
        paused.error = Some("disk full".into());
        assert_eq!(TorrentState::from_status(&paused), TorrentState::Paused);
    }

    #[test]
    fn maps_activities_to_states() {
        let cases = [
            (EngineActivity::CheckingFiles, TorrentState::Checking),
            (EngineActivity::CheckingResumeData, TorrentState::Checking),
            (EngineActivity::DownloadingMetadata, TorrentState::Downloading),
            (EngineActivity::Downloading, TorrentState::Downloading),
            (EngineActivity::Finished, TorrentState::Seeding),
            (EngineActivity::Seeding, TorrentState::Seeding),
        ];
        for (activity, expected) in cases {
            assert_eq!(TorrentState::from_status(&status(activity)), expected);
        }

        let mut magnet = status(EngineActivity::QueuedForChecking);
        magnet.has_metadata = false;
        assert_eq!(TorrentState::from_status(&magnet), TorrentState::Queued);
    }

    #[test]
    fn downloading_at_full_progress_is_complete() {
        let mut done = status(EngineActivity::Downloading);
        done.progress = 1.0;
        assert_eq!(TorrentState::from_status(&done), TorrentState::Complete);
    }

    #[test]
    fn refresh_clamps_progress_and_stamps_completion_once() {
        let handle = EngineHandle::new(1);
        let mut over = status(EngineActivity::Seeding);
        over.progress = 1.3;
        let mut record = TorrentRecord::from_status(handle, &over);
        assert!((record.progress - 1.0).abs() < f64::EPSILON);
        let first = record.completed_at;
        assert!(first.is_some());

        over.progress = -0.5;
        record.refresh(&over, Utc::now());
        assert!(record.progress.abs() < f64::EPSILON);
        assert_eq!(record.completed_at, first);
    }

    #[test]
    fn eta_requires_downloading_with_positive_rate() {
        let record = TorrentRecord::from_status(
            EngineHandle::new(1),
            &status(EngineActivity::Downloading),
        );
        assert_eq!(record.eta(), Some(15));

        let mut stalled = record.clone();
        stalled.download_rate = 0;
        assert_eq!(stalled.eta(), None);

        let mut finished = record.clone();
        finished.downloaded_bytes = finished.total_size;
        assert_eq!(finished.eta(), Some(0));

        let mut seeding = record;
        seeding.state = TorrentState::Seeding;
        assert_eq!(seeding.eta(), None);
    }

    #[test]
    fn ratio_uses_sentinel_without_downloads() {
        let mut record = TorrentRecord::from_status(
            EngineHandle::new(1),
            &status(EngineActivity::Downloading),
        );
        record.uploaded_bytes = 500;
        assert!((record.ratio() - 2.0).abs() < f64::EPSILON);

        record.downloaded_bytes = 0;
        assert!((record.ratio() - RATIO_INFINITE).abs() < f64::EPSILON);

        record.uploaded_bytes = 0;
        assert!(record.ratio().abs() < f64::EPSILON);
    }
}
