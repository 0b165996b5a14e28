//! The session coordinator.
//!
//! # Design
//! - One mutex guards the engine gateway and the tracked-record map; every public
//!   operation takes it for its whole critical section.
//! - Notifications are collected while the lock is held and dispatched after it is
//!   released, so handlers can call straight back into the coordinator.
//! - The record map is rebuilt from the engine on every reconciliation: the engine
//!   is authoritative for which torrents exist.
//! - Persistence is best-effort. Store failures are logged and never fail a command.
//!   Periodic checkpoints may be dropped under backpressure; deletes and the final
//!   checkpoint are not.
//! - A removed torrent stays readable until its removal handlers return.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::Utc;
use ftorrent_torrent_core::{
    EngineEvent, EngineHandle, InfoHash, TorrentDetails, TorrentError, TorrentRecord,
    TorrentResult,
};
use ftorrent_torrent_engine::{
    EngineGateway, EngineRuntimeConfig, MemoryProfile, SessionFactory,
};
use tracing::{debug, info, warn};

use crate::notify::{ErrorReport, Notification, NotificationHub};
use crate::stats::SessionStats;
use crate::store::PersistenceStore;
use crate::tracker::TrackerAugmentation;
use crate::writer::{Delivery, PersistenceMode, ResumeSink};

/// Default spacing between periodic resume checkpoints.
pub const DEFAULT_CHECKPOINT_INTERVAL: Duration = Duration::from_secs(30);

const THROTTLE_FALLBACK_DOWN_KBPS: u32 = 1_000;
const THROTTLE_FALLBACK_UP_KBPS: u32 = 200;

/// Tunables for a [`SessionCoordinator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorOptions {
    /// Minimum time between periodic checkpoints.
    pub checkpoint_interval: Duration,
    /// Where resume blobs are written from.
    pub persistence: PersistenceMode,
    /// Keep explicitly paused torrents paused across restarts.
    pub restore_paused_state: bool,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            persistence: PersistenceMode::default(),
            restore_paused_state: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RateLimits {
    download_kbps: u32,
    upload_kbps: u32,
}

impl RateLimits {
    fn from_config(config: &EngineRuntimeConfig) -> Self {
        let to_kbps = |bytes: u64| u32::try_from(bytes / 1024).unwrap_or(u32::MAX);
        Self {
            download_kbps: to_kbps(config.download_rate_limit),
            upload_kbps: to_kbps(config.upload_rate_limit),
        }
    }

    fn throttled(self) -> Self {
        let halve = |limit: u32, fallback: u32| {
            if limit == 0 { fallback } else { (limit / 2).max(1) }
        };
        Self {
            download_kbps: halve(self.download_kbps, THROTTLE_FALLBACK_DOWN_KBPS),
            upload_kbps: halve(self.upload_kbps, THROTTLE_FALLBACK_UP_KBPS),
        }
    }
}

struct CoordinatorState {
    gateway: EngineGateway,
    records: BTreeMap<InfoHash, TorrentRecord>,
    // Gone from the engine, kept in `records` while removal handlers run.
    removing: BTreeSet<InfoHash>,
    sink: Option<Arc<ResumeSink>>,
    last_checkpoint: Instant,
    limits: RateLimits,
    throttled: bool,
}

impl CoordinatorState {
    fn ensure_initialized(&self) -> TorrentResult<()> {
        if self.gateway.is_initialized() {
            Ok(())
        } else {
            Err(TorrentError::NotInitialized)
        }
    }

    fn handle_of(&self, info_hash: InfoHash) -> TorrentResult<EngineHandle> {
        self.records
            .get(&info_hash)
            .map(|record| record.handle)
            .ok_or(TorrentError::NotFound { info_hash })
    }

    fn apply_limits(&mut self) -> TorrentResult<()> {
        let effective = if self.throttled {
            self.limits.throttled()
        } else {
            self.limits
        };
        self.gateway
            .set_rate_limits(effective.download_kbps, effective.upload_kbps)
    }

    /// Returns `false` when the blob was not handed to the store.
    fn persist(&self, info_hash: InfoHash, bytes: Vec<u8>, delivery: Delivery) -> bool {
        match &self.sink {
            Some(sink) => sink.save(info_hash, bytes, delivery),
            None => {
                debug!(info_hash = %info_hash, "no resume store configured");
                false
            }
        }
    }

    fn forget(&self, info_hash: InfoHash) {
        if let Some(sink) = &self.sink {
            sink.delete(info_hash);
        }
    }

    fn stats(&self) -> SessionStats {
        SessionStats::from_records(self.records.values())
    }

    /// Refresh one record from the engine and queue its update notification.
    fn refresh_one(&mut self, info_hash: InfoHash, notes: &mut Vec<Notification>) {
        let Self {
            gateway, records, ..
        } = self;
        let Some(record) = records.get_mut(&info_hash) else {
            return;
        };
        match gateway.snapshot(record.handle) {
            Ok(status) => {
                record.refresh(&status, Utc::now());
                notes.push(Notification::Updated(record.clone()));
            }
            Err(err) => debug!(error = %err, info_hash = %info_hash, "status unavailable"),
        }
    }

    fn refresh_all(&mut self, notes: &mut Vec<Notification>) {
        let ids: Vec<InfoHash> = self.records.keys().copied().collect();
        for info_hash in ids {
            self.refresh_one(info_hash, notes);
        }
    }

    /// Align the record map with the engine's live handle set.
    fn reconcile(&mut self, notes: &mut Vec<Notification>) {
        let handles = match self.gateway.list_handles() {
            Ok(handles) => handles,
            Err(err) => {
                warn!(error = %err, "failed to enumerate engine torrents");
                return;
            }
        };

        let mut live = BTreeMap::new();
        for handle in handles {
            let status = match self.gateway.snapshot(handle) {
                Ok(status) => status,
                Err(err) => {
                    debug!(error = %err, handle = %handle, "skipping handle without status");
                    continue;
                }
            };
            live.insert(status.info_hash, handle);
            match self.records.get_mut(&status.info_hash) {
                Some(record) => record.handle = handle,
                None => {
                    let record = TorrentRecord::from_status(handle, &status);
                    info!(info_hash = %record.id, name = %record.name, "torrent tracked");
                    notes.push(Notification::Added(record.clone()));
                    self.records.insert(record.id, record);
                }
            }
        }

        let vanished: Vec<InfoHash> = self
            .records
            .keys()
            .filter(|info_hash| !live.contains_key(*info_hash))
            .filter(|info_hash| !self.removing.contains(*info_hash))
            .copied()
            .collect();
        for info_hash in vanished {
            if let Some(record) = self.records.remove(&info_hash) {
                warn!(
                    info_hash = %info_hash,
                    name = %record.name,
                    "torrent disappeared from the engine without a remove command"
                );
                notes.push(Notification::Removed(record));
            }
        }
    }

    fn checkpoint(&mut self) {
        let Self {
            gateway, records, ..
        } = self;
        let mut requested = 0_usize;
        for record in records.values().filter(|record| record.has_metadata) {
            match gateway.request_resume_data(record.handle) {
                Ok(()) => requested += 1,
                Err(err) => {
                    debug!(error = %err, info_hash = %record.id, "resume data request failed");
                }
            }
        }
        self.last_checkpoint = Instant::now();
        debug!(requested, "periodic checkpoint requested");
    }
}

/// Owns the engine gateway and the tracked-torrent map.
pub struct SessionCoordinator {
    state: Mutex<CoordinatorState>,
    hub: NotificationHub,
    store: Option<Arc<dyn PersistenceStore>>,
    augmentation: Option<Arc<dyn TrackerAugmentation>>,
    options: CoordinatorOptions,
}

impl fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("options", &self.options)
            .field("has_store", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

impl SessionCoordinator {
    /// Coordinator over sessions produced by `factory`. No store is attached.
    #[must_use]
    pub fn new(factory: SessionFactory, options: CoordinatorOptions) -> Self {
        Self {
            state: Mutex::new(CoordinatorState {
                gateway: EngineGateway::new(factory),
                records: BTreeMap::new(),
                removing: BTreeSet::new(),
                sink: None,
                last_checkpoint: Instant::now(),
                limits: RateLimits::default(),
                throttled: false,
            }),
            hub: NotificationHub::default(),
            store: None,
            augmentation: None,
            options,
        }
    }

    /// Attach the store used for restore and checkpoints.
    #[must_use]
    pub fn with_store(mut self, store: impl PersistenceStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Attach trackers to every torrent the engine confirms.
    #[must_use]
    pub fn with_tracker_augmentation(
        mut self,
        augmentation: impl TrackerAugmentation + 'static,
    ) -> Self {
        self.augmentation = Some(Arc::new(augmentation));
        self
    }

    /// Register the handler fired when a torrent becomes tracked.
    pub fn on_added(&self, handler: impl Fn(&TorrentRecord) + Send + Sync + 'static) {
        self.hub.on_added(handler);
    }

    /// Register the handler fired when a torrent stops being tracked.
    pub fn on_removed(&self, handler: impl Fn(&TorrentRecord) + Send + Sync + 'static) {
        self.hub.on_removed(handler);
    }

    /// Register the per-record refresh handler.
    pub fn on_updated(&self, handler: impl Fn(&TorrentRecord) + Send + Sync + 'static) {
        self.hub.on_updated(handler);
    }

    /// Register the per-cycle aggregate handler.
    pub fn on_stats_updated(&self, handler: impl Fn(&SessionStats) + Send + Sync + 'static) {
        self.hub.on_stats_updated(handler);
    }

    /// Register the error handler.
    pub fn on_error(&self, handler: impl Fn(&ErrorReport) + Send + Sync + 'static) {
        self.hub.on_error(handler);
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start the engine, then restore persisted torrents. A second call is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine session cannot start or the background
    /// writer cannot be spawned. Restore failures are logged and skipped.
    pub fn initialize(&self, config: &EngineRuntimeConfig) -> TorrentResult<()> {
        let mut notes = Vec::new();
        {
            let mut state = self.lock();
            if state.gateway.is_initialized() {
                debug!("session already initialized");
                return Ok(());
            }
            state.gateway.initialize(config)?;

            if let Some(store) = &self.store {
                match ResumeSink::open(Arc::clone(store), self.options.persistence) {
                    Ok(sink) => state.sink = Some(Arc::new(sink)),
                    Err(err) => {
                        state.gateway.shutdown();
                        return Err(TorrentError::startup(err));
                    }
                }
            }
            state.limits = RateLimits::from_config(config);
            state.throttled = false;
            state.last_checkpoint = Instant::now();

            self.restore(&mut state);
            state.reconcile(&mut notes);
            info!(torrents = state.records.len(), "session initialized");
        }
        self.hub.dispatch(notes);
        Ok(())
    }

    fn restore(&self, state: &mut CoordinatorState) {
        let Some(store) = &self.store else {
            return;
        };
        let blobs = match store.load_all() {
            Ok(blobs) => blobs,
            Err(err) => {
                warn!(error = %err, "failed to enumerate resume store");
                return;
            }
        };

        let mut restored = 0_usize;
        for (info_hash, bytes) in blobs {
            let mut params = match state.gateway.import_resume_state(&bytes) {
                Ok(params) => params,
                Err(err) => {
                    warn!(error = %err, info_hash = %info_hash, "skipping unreadable resume blob");
                    continue;
                }
            };
            if params.info_hash != info_hash {
                warn!(
                    info_hash = %info_hash,
                    blob_hash = %params.info_hash,
                    "skipping resume blob stored under a different identifier"
                );
                continue;
            }
            if !(self.options.restore_paused_state && params.explicitly_paused()) {
                params.paused = false;
                params.auto_managed = true;
            }
            match state.gateway.add_resumed(params) {
                Ok(_) => restored += 1,
                Err(err) => {
                    warn!(error = %err, info_hash = %info_hash, "failed to restore torrent");
                }
            }
        }
        info!(restored, "restored torrents from resume store");
    }

    /// Pause every torrent, release the engine, and stop the background writer.
    ///
    /// Does not write a final checkpoint; call [`Self::save_all_resume_data`] first.
    pub fn shutdown(&self) {
        let sink = {
            let mut state = self.lock();
            if !state.gateway.is_initialized() {
                return;
            }
            state.records.clear();
            state.removing.clear();
            state.gateway.shutdown();
            state.sink.take()
        };
        if let Some(sink) = sink {
            sink.close();
        }
        info!("session shut down");
    }

    /// Whether the engine session is running.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.lock().gateway.is_initialized()
    }

    /// Add a torrent from a metainfo file and start tracking it.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::InvalidSource`], [`TorrentError::DuplicateTorrent`],
    /// or [`TorrentError::NotInitialized`].
    pub fn add_torrent_file(&self, path: &Path, save_dir: &Path) -> TorrentResult<InfoHash> {
        self.add_with(|gateway| gateway.add_from_file(path, save_dir))
    }

    /// Add a torrent from a magnet URI and start tracking it.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::InvalidMagnetUri`], [`TorrentError::DuplicateTorrent`],
    /// or [`TorrentError::NotInitialized`].
    pub fn add_magnet_link(&self, uri: &str, save_dir: &Path) -> TorrentResult<InfoHash> {
        self.add_with(|gateway| gateway.add_from_magnet(uri, save_dir))
    }

    fn add_with<F>(&self, add: F) -> TorrentResult<InfoHash>
    where
        F: FnOnce(&mut EngineGateway) -> TorrentResult<EngineHandle>,
    {
        let mut notes = Vec::new();
        let info_hash = {
            let mut state = self.lock();
            state.ensure_initialized()?;
            let handle = add(&mut state.gateway)?;
            let info_hash = state.gateway.snapshot(handle)?.info_hash;
            state.reconcile(&mut notes);
            info_hash
        };
        self.hub.dispatch(notes);
        Ok(info_hash)
    }

    /// Stop tracking a torrent and delete its resume blob.
    ///
    /// Removing an identifier that is not tracked succeeds without notifying. The
    /// record stays visible to queries until the removal handlers have returned.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::NotInitialized`] or an engine failure.
    pub fn remove_torrent(&self, info_hash: InfoHash, delete_files: bool) -> TorrentResult<()> {
        let record = {
            let mut state = self.lock();
            state.ensure_initialized()?;
            if state.removing.contains(&info_hash) {
                debug!(info_hash = %info_hash, "torrent already being removed");
                return Ok(());
            }
            let Some(record) = state.records.get(&info_hash).cloned() else {
                debug!(info_hash = %info_hash, "remove of untracked torrent ignored");
                return Ok(());
            };
            state.gateway.remove(record.handle, delete_files)?;
            state.removing.insert(info_hash);
            state.forget(info_hash);
            record
        };
        info!(info_hash = %info_hash, delete_files, "torrent removed");
        self.hub.dispatch(vec![Notification::Removed(record)]);
        let mut state = self.lock();
        state.removing.remove(&info_hash);
        state.records.remove(&info_hash);
        Ok(())
    }

    /// Pause a torrent and take it out of the engine's queue management.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::NotFound`] for untracked identifiers.
    pub fn pause_torrent(&self, info_hash: InfoHash) -> TorrentResult<()> {
        self.toggle(info_hash, true)
    }

    /// Resume a torrent and hand it back to queue management.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::NotFound`] for untracked identifiers.
    pub fn resume_torrent(&self, info_hash: InfoHash) -> TorrentResult<()> {
        self.toggle(info_hash, false)
    }

    fn toggle(&self, info_hash: InfoHash, pause: bool) -> TorrentResult<()> {
        let mut notes = Vec::new();
        {
            let mut state = self.lock();
            state.ensure_initialized()?;
            let handle = state.handle_of(info_hash)?;
            if pause {
                state.gateway.pause(handle)?;
            } else {
                state.gateway.resume(handle)?;
            }
            state.refresh_one(info_hash, &mut notes);
        }
        debug!(info_hash = %info_hash, paused = pause, "torrent toggled");
        self.hub.dispatch(notes);
        Ok(())
    }

    /// Pause every tracked torrent.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::NotInitialized`]. Per-torrent failures are logged.
    pub fn pause_all(&self) -> TorrentResult<()> {
        self.toggle_all(true)
    }

    /// Resume every tracked torrent.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::NotInitialized`]. Per-torrent failures are logged.
    pub fn resume_all(&self) -> TorrentResult<()> {
        self.toggle_all(false)
    }

    fn toggle_all(&self, pause: bool) -> TorrentResult<()> {
        let mut notes = Vec::new();
        {
            let mut state = self.lock();
            state.ensure_initialized()?;
            let targets: Vec<(InfoHash, EngineHandle)> = state
                .records
                .values()
                .map(|record| (record.id, record.handle))
                .collect();
            for (info_hash, handle) in targets {
                let outcome = if pause {
                    state.gateway.pause(handle)
                } else {
                    state.gateway.resume(handle)
                };
                if let Err(err) = outcome {
                    warn!(error = %err, info_hash = %info_hash, paused = pause, "toggle failed");
                }
            }
            state.refresh_all(&mut notes);
        }
        info!(paused = pause, "all torrents toggled");
        self.hub.dispatch(notes);
        Ok(())
    }

    /// Set the configured session-wide limits in KiB/s; zero means unlimited.
    ///
    /// While throttled, the halved limits are applied instead.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::NotInitialized`].
    pub fn set_rate_limits(&self, download_kbps: u32, upload_kbps: u32) -> TorrentResult<()> {
        let mut state = self.lock();
        state.ensure_initialized()?;
        state.limits = RateLimits {
            download_kbps,
            upload_kbps,
        };
        state.apply_limits()
    }

    /// Enter or leave the reduced-bandwidth mode.
    ///
    /// Throttling halves the configured limits, falling back to 1000/200 KiB/s when
    /// a direction is unlimited.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::NotInitialized`].
    pub fn set_throttled(&self, throttled: bool) -> TorrentResult<()> {
        let mut state = self.lock();
        state.ensure_initialized()?;
        state.throttled = throttled;
        info!(throttled, "bandwidth throttle changed");
        state.apply_limits()
    }

    /// Apply an engine memory preset.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::NotInitialized`].
    pub fn set_memory_profile(&self, profile: MemoryProfile) -> TorrentResult<()> {
        let mut state = self.lock();
        state.ensure_initialized()?;
        state.gateway.apply_memory_profile(profile)
    }

    /// Snapshot of one tracked torrent.
    #[must_use]
    pub fn get_torrent(&self, info_hash: InfoHash) -> Option<TorrentRecord> {
        self.lock().records.get(&info_hash).cloned()
    }

    /// Snapshots of every tracked torrent, ordered by name then identifier.
    #[must_use]
    pub fn list_torrents(&self) -> Vec<TorrentRecord> {
        let mut records: Vec<TorrentRecord> = self.lock().records.values().cloned().collect();
        records.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        records
    }

    /// Number of tracked torrents.
    #[must_use]
    pub fn count(&self) -> usize {
        self.lock().records.len()
    }

    /// Number of downloading or seeding torrents.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.lock()
            .records
            .values()
            .filter(|record| record.is_active())
            .count()
    }

    /// Summed download rate in bytes per second.
    #[must_use]
    pub fn total_download_rate(&self) -> u64 {
        self.lock()
            .records
            .values()
            .map(|record| record.download_rate)
            .sum()
    }

    /// Summed upload rate in bytes per second.
    #[must_use]
    pub fn total_upload_rate(&self) -> u64 {
        self.lock()
            .records
            .values()
            .map(|record| record.upload_rate)
            .sum()
    }

    /// Aggregate counters over the tracked records.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.lock().stats()
    }

    /// Trackers, peers and files of one torrent, fetched live from the engine.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::NotFound`] for untracked identifiers.
    pub fn torrent_details(&self, info_hash: InfoHash) -> TorrentResult<TorrentDetails> {
        let state = self.lock();
        state.ensure_initialized()?;
        let handle = state.handle_of(info_hash)?;
        state.gateway.details(handle)
    }

    /// One coordination cycle: drain engine events, reconcile, refresh every
    /// record, checkpoint when due, and publish aggregate stats.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::NotInitialized`] after shutdown.
    pub fn update(&self) -> TorrentResult<()> {
        let mut notes = Vec::new();
        {
            let mut state = self.lock();
            state.ensure_initialized()?;
            let events = state.gateway.drain_events()?;
            for event in events {
                self.interpret(&mut state, event, &mut notes);
            }
            state.reconcile(&mut notes);
            state.refresh_all(&mut notes);
            if state.last_checkpoint.elapsed() >= self.options.checkpoint_interval {
                state.checkpoint();
            }
            notes.push(Notification::Stats(state.stats()));
        }
        self.hub.dispatch(notes);
        Ok(())
    }

    fn interpret(
        &self,
        state: &mut CoordinatorState,
        event: EngineEvent,
        notes: &mut Vec<Notification>,
    ) {
        match event {
            EngineEvent::TorrentError {
                info_hash,
                name,
                message,
                ..
            } => {
                let label = if name.is_empty() {
                    info_hash.to_string()
                } else {
                    name
                };
                warn!(info_hash = %info_hash, error = %message, "torrent error");
                notes.push(Notification::Error(ErrorReport {
                    torrent: Some(info_hash),
                    message: format!("Torrent error [{label}]: {message}"),
                }));
            }
            EngineEvent::FileError {
                info_hash,
                file,
                message,
                ..
            } => {
                warn!(info_hash = %info_hash, file = %file, error = %message, "file error");
                notes.push(Notification::Error(ErrorReport {
                    torrent: Some(info_hash),
                    message: format!("File error: {file} - {message}"),
                }));
            }
            EngineEvent::AddConfirmed { handle, info_hash } => {
                self.on_add_confirmed(state, handle, info_hash);
            }
            EngineEvent::AddFailed { info_hash, message } => {
                warn!(info_hash = ?info_hash, error = %message, "engine rejected torrent");
                notes.push(Notification::Error(ErrorReport {
                    torrent: info_hash,
                    message: format!("Failed to add torrent: {message}"),
                }));
            }
            EngineEvent::MetadataReceived { handle, info_hash } => {
                info!(info_hash = %info_hash, "metadata received");
                if let Err(err) = state.gateway.request_resume_data(handle) {
                    debug!(error = %err, info_hash = %info_hash, "resume data request failed");
                }
            }
            EngineEvent::ResumeDataReady {
                handle,
                info_hash,
                payload,
            } => {
                let live = state
                    .gateway
                    .snapshot(handle)
                    .is_ok_and(|status| status.info_hash == info_hash);
                let tracked = state.records.contains_key(&info_hash)
                    && !state.removing.contains(&info_hash);
                if tracked || live {
                    state.persist(info_hash, payload, Delivery::BestEffort);
                } else {
                    debug!(info_hash = %info_hash, "discarding resume data for removed torrent");
                }
            }
            EngineEvent::ResumeDataFailed {
                info_hash, message, ..
            } => {
                debug!(info_hash = %info_hash, reason = %message, "resume data unavailable");
            }
            EngineEvent::TrackerError {
                info_hash,
                url,
                message,
                ..
            } => {
                info!(info_hash = %info_hash, tracker = %url, error = %message, "tracker error");
            }
        }
    }

    fn on_add_confirmed(
        &self,
        state: &mut CoordinatorState,
        handle: EngineHandle,
        info_hash: InfoHash,
    ) {
        if let Some(augmentation) = &self.augmentation {
            let urls = augmentation.trackers_for(info_hash);
            if !urls.is_empty()
                && let Err(err) = state.gateway.add_trackers(handle, &urls)
            {
                debug!(error = %err, info_hash = %info_hash, "tracker augmentation failed");
            }
        }
        match state.gateway.snapshot(handle) {
            Ok(status) if status.paused && status.auto_managed => {
                if let Err(err) = state.gateway.resume(handle) {
                    warn!(error = %err, info_hash = %info_hash, "failed to resume confirmed torrent");
                }
            }
            Ok(_) => {}
            Err(err) => {
                debug!(error = %err, info_hash = %info_hash, "confirmed torrent already gone");
                return;
            }
        }
        if let Err(err) = state.gateway.request_resume_data(handle) {
            debug!(error = %err, info_hash = %info_hash, "initial resume export failed");
        }
        debug!(info_hash = %info_hash, "add confirmed");
    }

    /// Write resume data for every torrent with metadata, and wait for it to land.
    ///
    /// Waits for queue room rather than dropping blobs. Returns the number of
    /// blobs handed to the store.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::NotInitialized`]. Per-torrent failures are logged.
    pub fn save_all_resume_data(&self) -> TorrentResult<usize> {
        let (sink, saved) = {
            let state = self.lock();
            state.ensure_initialized()?;
            let mut saved = 0_usize;
            let exportable = state
                .records
                .values()
                .filter(|record| record.has_metadata && !state.removing.contains(&record.id));
            for record in exportable {
                match state.gateway.export_resume_state(record.handle) {
                    Ok(bytes) => {
                        if state.persist(record.id, bytes, Delivery::Guaranteed) {
                            saved += 1;
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, info_hash = %record.id, "failed to export resume data");
                    }
                }
            }
            (state.sink.clone(), saved)
        };
        if let Some(sink) = sink {
            sink.flush();
        }
        info!(saved, "resume data checkpoint written");
        Ok(saved)
    }
}

impl Drop for SessionCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
