//! Aggregate counters across tracked torrents.

use ftorrent_torrent_core::format::format_speed;
use ftorrent_torrent_core::{TorrentRecord, TorrentState};
use serde::Serialize;

/// Session-wide totals computed from the tracked records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Tracked torrents.
    pub torrents: usize,
    /// Torrents downloading or seeding.
    pub active: usize,
    /// Paused torrents.
    pub paused: usize,
    /// Torrents in the error state.
    pub errored: usize,
    /// Summed download rate in bytes per second.
    pub download_rate: u64,
    /// Summed upload rate in bytes per second.
    pub upload_rate: u64,
}

impl SessionStats {
    /// Fold a set of records into totals.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a TorrentRecord>) -> Self {
        records.into_iter().fold(Self::default(), |mut stats, record| {
            stats.torrents += 1;
            stats.download_rate += record.download_rate;
            stats.upload_rate += record.upload_rate;
            match record.state {
                TorrentState::Paused => stats.paused += 1,
                TorrentState::Error => stats.errored += 1,
                state if state.is_active() => stats.active += 1,
                _ => {}
            }
            stats
        })
    }

    /// One-line status summary, `Idle` when nothing is tracked.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.torrents == 0 {
            return "Idle".to_string();
        }
        format!(
            "Torrents: {} (Active: {})  |  ↓ {}  ↑ {}",
            self.torrents,
            self.active,
            format_speed(self.download_rate),
            format_speed(self.upload_rate)
        )
    }
}
