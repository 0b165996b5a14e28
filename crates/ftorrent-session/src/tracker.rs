//! Tracker augmentation applied when the engine confirms an add.

use ftorrent_torrent_core::InfoHash;

/// Supplies extra tracker URLs for newly confirmed torrents.
pub trait TrackerAugmentation: Send + Sync {
    /// Trackers to attach to the torrent; empty for none.
    fn trackers_for(&self, info_hash: InfoHash) -> Vec<String>;
}

/// The same tracker list for every torrent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticTrackers {
    urls: Vec<String>,
}

impl StaticTrackers {
    /// Build from a list of announce URLs, dropping blanks and duplicates.
    #[must_use]
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for url in urls {
            let url = url.into().trim().to_string();
            if !url.is_empty() && !unique.contains(&url) {
                unique.push(url);
            }
        }
        Self { urls: unique }
    }
}

impl TrackerAugmentation for StaticTrackers {
    fn trackers_for(&self, _info_hash: InfoHash) -> Vec<String> {
        self.urls.clone()
    }
}
