//! Default values and platform directories.
//!
//! # Design
//! - Values mirror what the desktop client shipped with, so an empty settings
//!   file behaves like a fresh install.
//! - Platform directories come from `directories`; every lookup has a relative
//!   fallback for environments without a home directory.

use std::path::PathBuf;

use directories::{ProjectDirs, UserDirs};

pub(crate) const LISTEN_INTERFACE: &str = "0.0.0.0";
pub(crate) const LISTEN_PORT: u16 = 6881;
pub(crate) const MAX_CONNECTIONS: u32 = 200;
pub(crate) const USER_AGENT: &str = "FTorrent/0.1.0";
pub(crate) const ACTIVE_DOWNLOADS: u32 = 20;
pub(crate) const ACTIVE_SEEDS: u32 = 20;
pub(crate) const ACTIVE_LIMIT: u32 = 50;
pub(crate) const CHECKPOINT_INTERVAL_SECS: u64 = 30;
pub(crate) const TICK_INTERVAL_MS: u64 = 100;
pub(crate) const WRITER_QUEUE_DEPTH: usize = 64;
pub(crate) const LOG_LEVEL: &str = "info";

/// DHT routers used to join the network.
pub const DHT_BOOTSTRAP_NODES: [&str; 4] = [
    "router.bittorrent.com:6881",
    "router.utorrent.com:6881",
    "dht.transmissionbt.com:6881",
    "dht.libtorrent.org:25401",
];

/// Name of the settings file inside the configuration directory.
pub const SETTINGS_FILE: &str = "settings.toml";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "ftorrent", "ftorrent")
}

/// `<config dir>/settings.toml`, when the platform has a configuration directory.
#[must_use]
pub fn settings_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
}

/// `<data dir>/resume`, falling back to `./ftorrent/resume`.
#[must_use]
pub fn resume_dir() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from("ftorrent").join("resume"),
        |dirs| dirs.data_dir().join("resume"),
    )
}

/// The user's download directory, falling back to `~/Downloads`, then `./Downloads`.
#[must_use]
pub fn save_path() -> PathBuf {
    UserDirs::new().map_or_else(
        || PathBuf::from("Downloads"),
        |dirs| {
            dirs.download_dir()
                .map_or_else(|| dirs.home_dir().join("Downloads"), PathBuf::from)
        },
    )
}
