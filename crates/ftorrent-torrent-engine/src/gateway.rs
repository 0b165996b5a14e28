//! Owner of the single engine session.
//!
//! # Design
//! - The gateway holds at most one session, built by an injected factory so
//!   the engine stays a black box to the rest of the workspace.
//! - Every command issued while no session exists fails with `NotInitialized`.
//! - Source parsing happens here; engines only ever see parsed metadata.
//! - Pause and resume toggle the auto-managed flag alongside the pause flag
//!   so the engine queue does not undo a user request.

use std::fs;
use std::path::Path;

use ftorrent_torrent_core::{
    EngineEvent, EngineHandle, EngineStatus, ResumeParams, TorrentDetails, TorrentError,
    TorrentResult,
};
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::magnet::MagnetLink;
use crate::metainfo::Metainfo;
use crate::session::{AddSource, AddTorrentParams, EngineSession};
use crate::types::{EngineRuntimeConfig, MemoryProfile, kib_to_bytes};

/// Builds an engine session from runtime configuration.
pub type SessionFactory =
    Box<dyn Fn(&EngineRuntimeConfig) -> TorrentResult<Box<dyn EngineSession>> + Send + Sync>;

/// Thin adapter around the engine's command and query surface.
pub struct EngineGateway {
    factory: SessionFactory,
    session: Option<Box<dyn EngineSession>>,
}

impl EngineGateway {
    /// Create an uninitialised gateway.
    #[must_use]
    pub fn new(factory: SessionFactory) -> Self {
        Self {
            factory,
            session: None,
        }
    }

    /// Whether a session is live.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    /// Build the engine session. A second call while live is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SessionStartup` when the configuration is unusable or the
    /// engine cannot bind or initialise.
    pub fn initialize(&mut self, config: &EngineRuntimeConfig) -> TorrentResult<()> {
        if self.session.is_some() {
            debug!("engine session already initialized");
            return Ok(());
        }
        validate(config).map_err(TorrentError::startup)?;

        let mut session = (self.factory)(config)?;
        session.set_rate_limits(config.download_rate_limit, config.upload_rate_limit);
        session.apply_memory_profile(config.memory_profile);
        self.session = Some(session);
        info!(
            listen = %config.listen_endpoint(),
            download_limit = config.download_rate_limit,
            upload_limit = config.upload_rate_limit,
            memory_profile = %config.memory_profile,
            "engine session initialized"
        );
        Ok(())
    }

    /// Pause every live torrent, then release the session. Idempotent.
    pub fn shutdown(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        for handle in session.handles() {
            if let Err(err) = session.set_paused(handle, true) {
                warn!(handle = %handle, error = %err, "failed to pause torrent during shutdown");
            }
        }
        drop(session);
        info!("engine session released");
    }

    /// Parse a `.torrent` file and admit it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSource` when the file cannot be read or parsed and
    /// `DuplicateTorrent` when the content is already live.
    pub fn add_from_file(&mut self, path: &Path, save_dir: &Path) -> TorrentResult<EngineHandle> {
        let session = self.session_mut()?;
        let bytes = fs::read(path).map_err(|err| TorrentError::InvalidSource {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        let metainfo = Metainfo::from_bytes(&bytes).map_err(|err| TorrentError::InvalidSource {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        let info_hash = metainfo.info_hash;
        let handle = session.add_torrent(AddTorrentParams::new(
            AddSource::Metainfo(metainfo),
            save_dir,
        ))?;
        info!(info_hash = %info_hash, path = %path.display(), "torrent file added");
        Ok(handle)
    }

    /// Parse a magnet URI and admit it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMagnetUri` on malformed input and `DuplicateTorrent`
    /// when the content is already live.
    pub fn add_from_magnet(&mut self, uri: &str, save_dir: &Path) -> TorrentResult<EngineHandle> {
        let session = self.session_mut()?;
        let link = MagnetLink::parse(uri).map_err(|err| TorrentError::InvalidMagnetUri {
            reason: err.to_string(),
        })?;
        let info_hash = link.info_hash;
        let handle =
            session.add_torrent(AddTorrentParams::new(AddSource::Magnet(link), save_dir))?;
        info!(info_hash = %info_hash, "magnet link added");
        Ok(handle)
    }

    /// Remove a torrent. A handle the engine no longer knows is not an error.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` without a session, or engine failures other
    /// than a stale handle.
    pub fn remove(&mut self, handle: EngineHandle, delete_files: bool) -> TorrentResult<()> {
        match self.session_mut()?.remove(handle, delete_files) {
            Ok(()) => Ok(()),
            Err(TorrentError::InvalidHandle { .. }) => {
                debug!(handle = %handle, "remove skipped for stale handle");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Pause a torrent and take it out of the engine queue.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` or `InvalidHandle`.
    pub fn pause(&mut self, handle: EngineHandle) -> TorrentResult<()> {
        let session = self.session_mut()?;
        session.set_auto_managed(handle, false)?;
        session.set_paused(handle, true)
    }

    /// Resume a torrent and hand it back to the engine queue.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` or `InvalidHandle`.
    pub fn resume(&mut self, handle: EngineHandle) -> TorrentResult<()> {
        let session = self.session_mut()?;
        session.set_auto_managed(handle, true)?;
        session.set_paused(handle, false)
    }

    /// Apply session-wide limits in KB/s (`0` = unlimited).
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` without a session.
    pub fn set_rate_limits(&mut self, download_kbps: u32, upload_kbps: u32) -> TorrentResult<()> {
        self.session_mut()?
            .set_rate_limits(kib_to_bytes(download_kbps), kib_to_bytes(upload_kbps));
        debug!(download_kbps, upload_kbps, "session rate limits applied");
        Ok(())
    }

    /// Apply a memory preset.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` without a session.
    pub fn apply_memory_profile(&mut self, profile: MemoryProfile) -> TorrentResult<()> {
        self.session_mut()?.apply_memory_profile(profile);
        Ok(())
    }

    /// Live handles.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` without a session.
    pub fn list_handles(&self) -> TorrentResult<Vec<EngineHandle>> {
        Ok(self.session()?.handles())
    }

    /// Point-in-time status of one torrent.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` or `InvalidHandle`.
    pub fn snapshot(&self, handle: EngineHandle) -> TorrentResult<EngineStatus> {
        self.session()?.status(handle)
    }

    /// Pop every queued engine event.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` without a session.
    pub fn drain_events(&mut self) -> TorrentResult<Vec<EngineEvent>> {
        Ok(self.session_mut()?.pop_events())
    }

    /// Ask the engine for resume data; the blob arrives as an event.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` or `InvalidHandle`.
    pub fn request_resume_data(&mut self, handle: EngineHandle) -> TorrentResult<()> {
        self.session_mut()?.request_resume_data(handle)
    }

    /// Serialize resume data synchronously.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized`, `InvalidHandle`, or an encoding failure.
    pub fn export_resume_state(&self, handle: EngineHandle) -> TorrentResult<Vec<u8>> {
        self.session()?.export_resume_state(handle)
    }

    /// Decode a resume blob into add parameters.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` or `ResumeData`.
    pub fn import_resume_state(&self, bytes: &[u8]) -> TorrentResult<ResumeParams> {
        self.session()?.import_resume_state(bytes)
    }

    /// Admit a torrent from decoded resume data.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized`, `ResumeData`, or `DuplicateTorrent`.
    pub fn add_resumed(&mut self, params: ResumeParams) -> TorrentResult<EngineHandle> {
        self.session_mut()?.add_resumed(params)
    }

    /// Trackers, peers and files of one torrent.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` or `InvalidHandle`.
    pub fn details(&self, handle: EngineHandle) -> TorrentResult<TorrentDetails> {
        let session = self.session()?;
        Ok(TorrentDetails {
            trackers: session.trackers(handle)?,
            peers: session.peers(handle)?,
            files: session.files(handle)?,
        })
    }

    /// Append trackers to a torrent.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` or `InvalidHandle`.
    pub fn add_trackers(&mut self, handle: EngineHandle, urls: &[String]) -> TorrentResult<()> {
        self.session_mut()?.add_trackers(handle, urls)
    }

    fn session(&self) -> TorrentResult<&dyn EngineSession> {
        self.session
            .as_deref()
            .ok_or(TorrentError::NotInitialized)
    }

    fn session_mut(&mut self) -> TorrentResult<&mut (dyn EngineSession + 'static)> {
        self.session
            .as_deref_mut()
            .ok_or(TorrentError::NotInitialized)
    }
}

impl Drop for EngineGateway {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn validate(config: &EngineRuntimeConfig) -> Result<(), EngineError> {
    if config.user_agent.trim().is_empty() {
        return Err(EngineError::InvalidConfig {
            field: "user_agent",
            reason: "must not be empty",
        });
    }
    if config.max_connections == 0 {
        return Err(EngineError::InvalidConfig {
            field: "max_connections",
            reason: "must be positive",
        });
    }
    if config.listen_interface.trim().is_empty() {
        return Err(EngineError::InvalidConfig {
            field: "listen_interface",
            reason: "must not be empty",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryEngine;

    fn local_config() -> EngineRuntimeConfig {
        EngineRuntimeConfig {
            listen_interface: "127.0.0.1".into(),
            listen_port: 0,
            ..EngineRuntimeConfig::default()
        }
    }

    #[test]
    fn commands_before_initialize_are_rejected() {
        let mut gateway = EngineGateway::new(MemoryEngine::new().factory());
        assert!(matches!(
            gateway.list_handles(),
            Err(TorrentError::NotInitialized)
        ));
        assert!(matches!(
            gateway.add_from_magnet("magnet:?xt=urn:btih:abc", Path::new("/d")),
            Err(TorrentError::NotInitialized)
        ));
    }

    #[test]
    fn invalid_config_fails_startup_without_building_a_session() {
        let engine = MemoryEngine::new();
        let mut gateway = EngineGateway::new(engine.factory());
        let config = EngineRuntimeConfig {
            user_agent: "  ".into(),
            ..local_config()
        };
        assert!(matches!(
            gateway.initialize(&config),
            Err(TorrentError::SessionStartup { .. })
        ));
        assert_eq!(engine.sessions_started(), 0);
        assert!(!gateway.is_initialized());
    }

    #[test]
    fn initialize_applies_limits_and_is_idempotent() -> anyhow::Result<()> {
        let engine = MemoryEngine::new();
        let mut gateway = EngineGateway::new(engine.factory());
        let config = EngineRuntimeConfig {
            download_rate_limit: 2048,
            memory_profile: MemoryProfile::Eco,
            ..local_config()
        };
        gateway.initialize(&config)?;
        gateway.initialize(&config)?;
        assert_eq!(engine.sessions_started(), 1);
        assert_eq!(engine.rate_limits(), (2048, 0));
        assert_eq!(engine.memory_profile(), MemoryProfile::Eco);

        gateway.set_rate_limits(100, 0)?;
        assert_eq!(engine.rate_limits(), (102_400, 0));
        Ok(())
    }

    #[test]
    fn shutdown_is_idempotent_and_blocks_further_commands() -> anyhow::Result<()> {
        let engine = MemoryEngine::new();
        let mut gateway = EngineGateway::new(engine.factory());
        gateway.initialize(&local_config())?;
        assert!(engine.is_running());
        gateway.shutdown();
        gateway.shutdown();
        assert!(!engine.is_running());
        assert!(matches!(
            gateway.drain_events(),
            Err(TorrentError::NotInitialized)
        ));
        Ok(())
    }

    #[test]
    fn malformed_magnet_is_rejected() -> anyhow::Result<()> {
        let mut gateway = EngineGateway::new(MemoryEngine::new().factory());
        gateway.initialize(&local_config())?;
        assert!(matches!(
            gateway.add_from_magnet("magnet:?dn=nothing", Path::new("/d")),
            Err(TorrentError::InvalidMagnetUri { .. })
        ));
        assert!(gateway.list_handles()?.is_empty());
        Ok(())
    }

    #[test]
    fn unreadable_file_is_invalid_source() -> anyhow::Result<()> {
        let mut gateway = EngineGateway::new(MemoryEngine::new().factory());
        gateway.initialize(&local_config())?;
        let dir = tempfile::tempdir()?;
        let bogus = dir.path().join("bogus.torrent");
        fs::write(&bogus, b"definitely not bencode")?;
        for path in [bogus.as_path(), dir.path().join("missing.torrent").as_path()] {
            assert!(matches!(
                gateway.add_from_file(path, dir.path()),
                Err(TorrentError::InvalidSource { .. })
            ));
        }
        Ok(())
    }
}
