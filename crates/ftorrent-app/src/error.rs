//! # Design
//!
//! - Centralize application-level errors for bootstrap and the update loop.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Settings could not be loaded or were invalid.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        #[source]
        source: ftorrent_config::ConfigError,
    },
    /// Logging could not be installed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        #[source]
        source: anyhow::Error,
    },
    /// Session operations failed.
    #[error("torrent operation failed")]
    Torrent {
        /// Operation identifier.
        operation: &'static str,
        /// Source torrent error.
        #[source]
        source: ftorrent_torrent_core::TorrentError,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: ftorrent_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(operation: &'static str, source: anyhow::Error) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn torrent(
        operation: &'static str,
        source: ftorrent_torrent_core::TorrentError,
    ) -> Self {
        Self::Torrent { operation, source }
    }
}
