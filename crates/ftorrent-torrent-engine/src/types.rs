//! Strongly typed inputs applied to the engine session.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Wrapper for boolean flags to avoid pedantic lint churn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Toggle(pub bool);

impl Toggle {
    #[must_use]
    /// Whether the toggle is enabled.
    pub const fn is_enabled(self) -> bool {
        self.0
    }
}

impl From<bool> for Toggle {
    fn from(value: bool) -> Self {
        Self(value)
    }
}

impl From<Toggle> for bool {
    fn from(toggle: Toggle) -> Self {
        toggle.0
    }
}

/// Disk cache and connection presets traded against resident memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryProfile {
    /// No write-back buffer; smallest footprint.
    Eco,
    /// Moderate buffering.
    #[default]
    Balanced,
    /// Large buffers for throughput.
    Performance,
}

impl MemoryProfile {
    /// Disk cache budget in MiB.
    #[must_use]
    pub const fn cache_size_mib(self) -> u32 {
        match self {
            Self::Eco => 0,
            Self::Balanced => 64,
            Self::Performance => 512,
        }
    }

    /// Send buffer watermark in KiB.
    #[must_use]
    pub const fn send_buffer_kib(self) -> u32 {
        match self {
            Self::Eco => 128,
            Self::Balanced => 512,
            Self::Performance => 4096,
        }
    }

    /// Numeric mode used by settings files (`0` eco, `1` balanced, `2` performance).
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Eco),
            1 => Some(Self::Balanced),
            2 => Some(Self::Performance),
            _ => None,
        }
    }

    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eco => "eco",
            Self::Balanced => "balanced",
            Self::Performance => "performance",
        }
    }
}

impl fmt::Display for MemoryProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryProfile {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eco" | "0" => Ok(Self::Eco),
            "balanced" | "normal" | "1" => Ok(Self::Balanced),
            "performance" | "turbo" | "2" => Ok(Self::Performance),
            _ => Err("unknown memory profile"),
        }
    }
}

/// Public DHT routers used to join the network.
pub const DEFAULT_DHT_BOOTSTRAP_NODES: [&str; 4] = [
    "router.bittorrent.com:6881",
    "router.utorrent.com:6881",
    "dht.transmissionbt.com:6881",
    "dht.libtorrent.org:25401",
];

/// Runtime parameters applied to the engine session at initialisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRuntimeConfig {
    /// Interface the peer listener binds to.
    pub listen_interface: String,
    /// Peer listen port (`0` picks an ephemeral port).
    pub listen_port: u16,
    /// Global download limit in bytes per second (`0` = unlimited).
    pub download_rate_limit: u64,
    /// Global upload limit in bytes per second (`0` = unlimited).
    pub upload_rate_limit: u64,
    /// Maximum peer connections across the session.
    pub max_connections: u32,
    /// Whether the distributed hash table is enabled.
    pub enable_dht: Toggle,
    /// Whether peer exchange is enabled.
    pub enable_pex: Toggle,
    /// Whether local service discovery is enabled.
    pub enable_lsd: Toggle,
    /// Whether `UPnP` port mapping is enabled.
    pub enable_upnp: Toggle,
    /// Whether NAT-PMP port mapping is enabled.
    pub enable_natpmp: Toggle,
    /// User agent announced to trackers and peers.
    pub user_agent: String,
    /// Engine queue: concurrently downloading torrents.
    pub active_downloads: u32,
    /// Engine queue: concurrently seeding torrents.
    pub active_seeds: u32,
    /// Engine queue: overall active torrents.
    pub active_limit: u32,
    /// DHT bootstrap routers as `host:port`.
    pub dht_bootstrap_nodes: Vec<String>,
    /// Memory preset applied at startup.
    pub memory_profile: MemoryProfile,
}

impl Default for EngineRuntimeConfig {
    fn default() -> Self {
        Self {
            listen_interface: "0.0.0.0".to_string(),
            listen_port: 6881,
            download_rate_limit: 0,
            upload_rate_limit: 0,
            max_connections: 200,
            enable_dht: Toggle(true),
            enable_pex: Toggle(true),
            enable_lsd: Toggle(true),
            enable_upnp: Toggle(true),
            enable_natpmp: Toggle(true),
            user_agent: "FTorrent/0.1.0".to_string(),
            active_downloads: 20,
            active_seeds: 20,
            active_limit: 50,
            dht_bootstrap_nodes: DEFAULT_DHT_BOOTSTRAP_NODES
                .iter()
                .map(ToString::to_string)
                .collect(),
            memory_profile: MemoryProfile::Balanced,
        }
    }
}

impl EngineRuntimeConfig {
    /// Listen endpoint as `interface:port`.
    #[must_use]
    pub fn listen_endpoint(&self) -> String {
        format!("{}:{}", self.listen_interface, self.listen_port)
    }

    /// DHT routers joined with commas, the form engines take them in.
    #[must_use]
    pub fn dht_bootstrap_list(&self) -> String {
        self.dht_bootstrap_nodes.join(",")
    }
}

/// Convert a KB/s limit into bytes per second, keeping `0` as unlimited.
#[must_use]
pub fn kib_to_bytes(kib_per_second: u32) -> u64 {
    u64::from(kib_per_second) * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_desktop_client_profile() {
        let config = EngineRuntimeConfig::default();
        assert_eq!(config.listen_endpoint(), "0.0.0.0:6881");
        assert_eq!(config.max_connections, 200);
        assert!(config.enable_dht.is_enabled());
        assert_eq!(config.dht_bootstrap_nodes.len(), 4);
        assert!(config.dht_bootstrap_list().ends_with("dht.libtorrent.org:25401"));
    }

    #[test]
    fn memory_profile_accepts_labels_and_indices() {
        assert_eq!("turbo".parse::<MemoryProfile>(), Ok(MemoryProfile::Performance));
        assert_eq!("0".parse::<MemoryProfile>(), Ok(MemoryProfile::Eco));
        assert_eq!(MemoryProfile::from_index(1), Some(MemoryProfile::Balanced));
        assert_eq!(MemoryProfile::from_index(3), None);
        assert!("huge".parse::<MemoryProfile>().is_err());
        assert_eq!(MemoryProfile::Eco.cache_size_mib(), 0);
    }

    #[test]
    fn kib_conversion_preserves_unlimited() {
        assert_eq!(kib_to_bytes(0), 0);
        assert_eq!(kib_to_bytes(100), 102_400);
    }
}
