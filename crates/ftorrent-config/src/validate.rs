//! Field checks applied after loading and overrides.

use std::net::IpAddr;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{PersistenceKind, Settings};

impl Settings {
    /// Reject values the engine or coordinator cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] naming the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        let network = &self.network;
        if network.listen_interface.parse::<IpAddr>().is_err() {
            return Err(ConfigError::invalid(
                "network",
                "listen_interface",
                Some(network.listen_interface.clone()),
                "must be an IP address",
            ));
        }
        if network.listen_port == 0 {
            return Err(ConfigError::invalid(
                "network",
                "listen_port",
                Some("0".into()),
                "must be between 1 and 65535",
            ));
        }
        if network.max_connections == 0 {
            return Err(ConfigError::invalid(
                "network",
                "max_connections",
                Some("0".into()),
                "must be positive",
            ));
        }
        if network.user_agent.trim().is_empty() {
            return Err(ConfigError::invalid(
                "network",
                "user_agent",
                None,
                "must not be empty",
            ));
        }

        for node in &self.discovery.dht_bootstrap_nodes {
            if !is_host_port(node) {
                return Err(ConfigError::invalid(
                    "discovery",
                    "dht_bootstrap_nodes",
                    Some(node.clone()),
                    "must be host:port",
                ));
            }
        }
        for tracker in &self.discovery.extra_trackers {
            if !tracker.contains("://") {
                return Err(ConfigError::invalid(
                    "discovery",
                    "extra_trackers",
                    Some(tracker.clone()),
                    "must be an absolute URL",
                ));
            }
        }

        let storage = &self.storage;
        if storage.persistence == PersistenceKind::Background && storage.writer_queue_depth == 0 {
            return Err(ConfigError::invalid(
                "storage",
                "writer_queue_depth",
                Some("0".into()),
                "must be positive",
            ));
        }
        if storage.checkpoint_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "storage",
                "checkpoint_interval_secs",
                Some("0".into()),
                "must be positive",
            ));
        }
        if self.session.tick_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "session",
                "tick_interval_ms",
                Some("0".into()),
                "must be positive",
            ));
        }
        Ok(())
    }
}

fn is_host_port(entry: &str) -> bool {
    entry.rsplit_once(':').is_some_and(|(host, port)| {
        !host.trim().is_empty() && port.parse::<u16>().is_ok_and(|port| port > 0)
    })
}
