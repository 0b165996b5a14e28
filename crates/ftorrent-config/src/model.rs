//! Typed settings sections.
//!
//! # Design
//! - Pure data carriers; every section defaults field-by-field, so a partial
//!   file only overrides what it names.
//! - Unknown keys are rejected to surface typos instead of silently ignoring them.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Transparent wrapper for boolean feature toggles to avoid pedantic lint churn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Toggle(pub bool);

impl Toggle {
    /// Whether the toggle is enabled.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        self.0
    }
}

impl Default for Toggle {
    fn default() -> Self {
        Self(true)
    }
}

/// Full settings document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Listener, limits and identity.
    pub network: NetworkSettings,
    /// Peer discovery subsystems.
    pub discovery: DiscoverySettings,
    /// Download and resume-data locations.
    pub storage: StorageSettings,
    /// Queueing, memory and coordination cadence.
    pub session: SessionSettings,
    /// Log level and output format.
    pub logging: LoggingSettings,
}

/// Listener, limits and identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkSettings {
    /// Interface address to listen on.
    pub listen_interface: String,
    /// Listen port.
    pub listen_port: u16,
    /// Download limit in KiB/s; 0 is unlimited.
    pub download_limit_kbps: u32,
    /// Upload limit in KiB/s; 0 is unlimited.
    pub upload_limit_kbps: u32,
    /// Maximum peer connections.
    pub max_connections: u32,
    /// Client identification string.
    pub user_agent: String,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            listen_interface: defaults::LISTEN_INTERFACE.to_string(),
            listen_port: defaults::LISTEN_PORT,
            download_limit_kbps: 0,
            upload_limit_kbps: 0,
            max_connections: defaults::MAX_CONNECTIONS,
            user_agent: defaults::USER_AGENT.to_string(),
        }
    }
}

/// Peer discovery subsystems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoverySettings {
    /// Distributed hash table.
    pub dht: Toggle,
    /// Peer exchange.
    pub pex: Toggle,
    /// Local service discovery.
    pub lsd: Toggle,
    /// `UPnP` port mapping.
    pub upnp: Toggle,
    /// NAT-PMP port mapping.
    pub natpmp: Toggle,
    /// DHT routers as `host:port`.
    pub dht_bootstrap_nodes: Vec<String>,
    /// Trackers attached to every newly added torrent.
    pub extra_trackers: Vec<String>,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            dht: Toggle::default(),
            pex: Toggle::default(),
            lsd: Toggle::default(),
            upnp: Toggle::default(),
            natpmp: Toggle::default(),
            dht_bootstrap_nodes: defaults::DHT_BOOTSTRAP_NODES
                .iter()
                .map(ToString::to_string)
                .collect(),
            extra_trackers: Vec::new(),
        }
    }
}

/// Resume-blob write strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceKind {
    /// Write on the coordinating thread.
    Inline,
    /// Write from a background worker.
    #[default]
    Background,
}

/// Download and resume-data locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageSettings {
    /// Default download directory.
    pub save_path: PathBuf,
    /// Resume-blob directory.
    pub resume_dir: PathBuf,
    /// Resume-blob write strategy.
    pub persistence: PersistenceKind,
    /// Background writer queue capacity.
    pub writer_queue_depth: usize,
    /// Seconds between periodic checkpoints.
    pub checkpoint_interval_secs: u64,
    /// Keep explicitly paused torrents paused across restarts.
    pub restore_paused_state: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            save_path: defaults::save_path(),
            resume_dir: defaults::resume_dir(),
            persistence: PersistenceKind::default(),
            writer_queue_depth: defaults::WRITER_QUEUE_DEPTH,
            checkpoint_interval_secs: defaults::CHECKPOINT_INTERVAL_SECS,
            restore_paused_state: true,
        }
    }
}

/// Engine memory preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryMode {
    /// Small caches.
    Eco,
    /// Engine defaults.
    #[default]
    #[serde(alias = "normal")]
    Balanced,
    /// Large caches.
    #[serde(alias = "turbo")]
    Performance,
}

/// Queueing, memory and coordination cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionSettings {
    /// Concurrent downloading torrents.
    pub active_downloads: u32,
    /// Concurrent seeding torrents.
    pub active_seeds: u32,
    /// Concurrent active torrents overall.
    pub active_limit: u32,
    /// Engine memory preset.
    pub memory_mode: MemoryMode,
    /// Milliseconds between coordinator updates.
    pub tick_interval_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            active_downloads: defaults::ACTIVE_DOWNLOADS,
            active_seeds: defaults::ACTIVE_SEEDS,
            active_limit: defaults::ACTIVE_LIMIT,
            memory_mode: MemoryMode::default(),
            tick_interval_ms: defaults::TICK_INTERVAL_MS,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatSetting {
    /// Structured JSON lines.
    Json,
    /// Human-readable output.
    Pretty,
}

/// Log level and output format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    /// Output format; inferred from the build profile when unset.
    pub format: Option<LogFormatSetting>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            format: None,
        }
    }
}
