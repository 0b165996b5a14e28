//! Translation from user-facing settings into engine and coordinator tunables.
//!
//! # Design
//! - Settings stay the single source of truth; nothing here reads the
//!   environment or the filesystem.
//! - Unit conversions (KiB/s to bytes/s, seconds to durations) happen once here.

use std::path::PathBuf;
use std::time::Duration;

use ftorrent_config::{MemoryMode, PersistenceKind, Settings};
use ftorrent_session::{CoordinatorOptions, PersistenceMode};
use ftorrent_torrent_engine::types::kib_to_bytes;
use ftorrent_torrent_engine::{EngineRuntimeConfig, MemoryProfile, Toggle};

/// Everything the bootstrap needs to start a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlan {
    /// Engine runtime configuration.
    pub runtime: EngineRuntimeConfig,
    /// Coordinator tunables.
    pub options: CoordinatorOptions,
    /// Resume-blob directory.
    pub resume_dir: PathBuf,
    /// Download directory for sources added at startup.
    pub save_path: PathBuf,
    /// Spacing between coordinator updates.
    pub tick_interval: Duration,
    /// Trackers attached to every added torrent.
    pub extra_trackers: Vec<String>,
}

impl SessionPlan {
    /// Derive a plan from validated settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        let Settings {
            network,
            discovery,
            storage,
            session,
            ..
        } = settings;

        let runtime = EngineRuntimeConfig {
            listen_interface: network.listen_interface.clone(),
            listen_port: network.listen_port,
            download_rate_limit: kib_to_bytes(network.download_limit_kbps),
            upload_rate_limit: kib_to_bytes(network.upload_limit_kbps),
            max_connections: network.max_connections,
            enable_dht: Toggle(discovery.dht.is_enabled()),
            enable_pex: Toggle(discovery.pex.is_enabled()),
            enable_lsd: Toggle(discovery.lsd.is_enabled()),
            enable_upnp: Toggle(discovery.upnp.is_enabled()),
            enable_natpmp: Toggle(discovery.natpmp.is_enabled()),
            user_agent: network.user_agent.clone(),
            active_downloads: session.active_downloads,
            active_seeds: session.active_seeds,
            active_limit: session.active_limit,
            dht_bootstrap_nodes: discovery.dht_bootstrap_nodes.clone(),
            memory_profile: memory_profile(session.memory_mode),
        };

        let persistence = match storage.persistence {
            PersistenceKind::Inline => PersistenceMode::Inline,
            PersistenceKind::Background => PersistenceMode::Background {
                queue_depth: storage.writer_queue_depth,
            },
        };

        Self {
            runtime,
            options: CoordinatorOptions {
                checkpoint_interval: Duration::from_secs(storage.checkpoint_interval_secs),
                persistence,
                restore_paused_state: storage.restore_paused_state,
            },
            resume_dir: storage.resume_dir.clone(),
            save_path: storage.save_path.clone(),
            tick_interval: Duration::from_millis(session.tick_interval_ms),
            extra_trackers: discovery.extra_trackers.clone(),
        }
    }
}

const fn memory_profile(mode: MemoryMode) -> MemoryProfile {
    match mode {
        MemoryMode::Eco => MemoryProfile::Eco,
        MemoryMode::Balanced => MemoryProfile::Balanced,
        MemoryMode::Performance => MemoryProfile::Performance,
    }
}
