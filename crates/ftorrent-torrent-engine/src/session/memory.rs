//! In-process engine used by tests and headless runs.
//!
//! # Design
//! - [`MemoryEngine`] is a cloneable controller over shared state. Its
//!   [`MemoryEngine::factory`] builds sessions bound to that state, so tests
//!   can script the swarm while the gateway owns the session.
//! - Each session binds a real TCP listener so port conflicts surface as
//!   startup failures.
//! - Activity advances one step per `pop_events` call for unpaused torrents.
//! - Resume blobs are JSON with the metainfo embedded as base64.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use ftorrent_torrent_core::{
    EngineActivity, EngineEvent, EngineHandle, EngineStatus, FileInfo, InfoHash, PeerInfo,
    ResumeParams, TorrentError, TorrentResult, TrackerInfo, TrackerStatus,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{AddSource, AddTorrentParams, EngineSession};
use crate::error::{EngineError, op_failed};
use crate::gateway::SessionFactory;
use crate::metainfo::MetainfoFile;
use crate::types::{EngineRuntimeConfig, MemoryProfile};

const RESUME_FORMAT: &str = "ftorrent-resume";
const RESUME_VERSION: u32 = 1;
const DEFAULT_FILE_PRIORITY: u8 = 4;

/// Transfer counters injected into a torrent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferSample {
    /// Verified bytes downloaded so far.
    pub downloaded: u64,
    /// Bytes uploaded so far.
    pub uploaded: u64,
    /// Current download rate in bytes per second, before session limits.
    pub download_rate: u64,
    /// Current upload rate in bytes per second, before session limits.
    pub upload_rate: u64,
}

/// Controller for the in-memory engine.
#[derive(Clone, Default)]
pub struct MemoryEngine {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    torrents: BTreeMap<EngineHandle, MemoryTorrent>,
    next_handle: u64,
    events: Vec<EngineEvent>,
    download_limit: u64,
    upload_limit: u64,
    memory_profile: MemoryProfile,
    listen_addr: Option<SocketAddr>,
    sessions_started: usize,
    failing_resume: HashSet<InfoHash>,
    removals: Vec<(InfoHash, bool)>,
}

#[derive(Debug, Clone)]
struct MemoryTorrent {
    info_hash: InfoHash,
    name: String,
    save_path: PathBuf,
    metainfo: Option<Vec<u8>>,
    files: Vec<MetainfoFile>,
    trackers: Vec<String>,
    tracker_errors: HashMap<String, String>,
    has_metadata: bool,
    total_wanted: u64,
    downloaded: u64,
    uploaded: u64,
    download_rate: u64,
    upload_rate: u64,
    peers: Vec<PeerInfo>,
    added_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    activity: EngineActivity,
    paused: bool,
    auto_managed: bool,
    error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResumeBlob {
    format: String,
    version: u32,
    info_hash: InfoHash,
    name: String,
    save_path: PathBuf,
    paused: bool,
    auto_managed: bool,
    added_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    has_metadata: bool,
    total_wanted: u64,
    downloaded: u64,
    uploaded: u64,
    trackers: Vec<String>,
    files: Vec<ResumeFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metainfo: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResumeFile {
    path: String,
    length: u64,
}

fn lock(state: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[expect(
    clippy::cast_precision_loss,
    reason = "byte counters only feed progress fractions"
)]
fn fraction(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part.min(whole) as f64 / whole as f64
    }
}

const fn capped(rate: u64, limit: u64) -> u64 {
    if limit == 0 || rate < limit {
        rate
    } else {
        limit
    }
}

impl MemoryTorrent {
    fn from_params(params: AddTorrentParams) -> Self {
        let mut torrent = Self {
            info_hash: params.source.info_hash(),
            name: String::new(),
            save_path: params.save_path,
            metainfo: None,
            files: Vec::new(),
            trackers: Vec::new(),
            tracker_errors: HashMap::new(),
            has_metadata: false,
            total_wanted: 0,
            downloaded: 0,
            uploaded: 0,
            download_rate: 0,
            upload_rate: 0,
            peers: Vec::new(),
            added_at: Utc::now(),
            completed_at: None,
            activity: EngineActivity::QueuedForChecking,
            paused: params.paused,
            auto_managed: params.auto_managed,
            error: None,
        };
        match params.source {
            AddSource::Metainfo(metainfo) => {
                torrent.total_wanted = metainfo.total_size();
                torrent.name = metainfo.name;
                torrent.files = metainfo.files;
                torrent.trackers = metainfo.trackers;
                torrent.metainfo = Some(metainfo.raw);
                torrent.has_metadata = true;
                torrent.activity = EngineActivity::CheckingResumeData;
            }
            AddSource::Magnet(link) => {
                torrent.name = link.display_name.unwrap_or_default();
                torrent.trackers = link.trackers;
            }
        }
        torrent
    }

    fn from_resume(params: ResumeParams, blob: ResumeBlob) -> TorrentResult<Self> {
        let metainfo = blob
            .metainfo
            .map(|encoded| STANDARD.decode(encoded))
            .transpose()
            .map_err(|err| TorrentError::ResumeData {
                operation: "add_resumed",
                reason: err.to_string(),
            })?;
        Ok(Self {
            info_hash: params.info_hash,
            name: params.name,
            save_path: params.save_path,
            metainfo,
            files: blob
                .files
                .into_iter()
                .map(|file| MetainfoFile {
                    path: file.path,
                    length: file.length,
                })
                .collect(),
            trackers: blob.trackers,
            tracker_errors: HashMap::new(),
            has_metadata: blob.has_metadata,
            total_wanted: blob.total_wanted,
            downloaded: blob.downloaded,
            uploaded: blob.uploaded,
            download_rate: 0,
            upload_rate: 0,
            peers: Vec::new(),
            added_at: blob.added_at,
            completed_at: blob.completed_at,
            activity: if blob.has_metadata {
                EngineActivity::CheckingResumeData
            } else {
                EngineActivity::QueuedForChecking
            },
            paused: params.paused,
            auto_managed: params.auto_managed,
            error: None,
        })
    }

    const fn is_complete(&self) -> bool {
        self.total_wanted > 0 && self.downloaded >= self.total_wanted
    }

    fn advance(&mut self) {
        if self.paused || self.error.is_some() {
            return;
        }
        self.activity = match self.activity {
            EngineActivity::QueuedForChecking if !self.has_metadata => {
                EngineActivity::DownloadingMetadata
            }
            EngineActivity::QueuedForChecking
            | EngineActivity::CheckingFiles
            | EngineActivity::CheckingResumeData
            | EngineActivity::Downloading
                if self.is_complete() =>
            {
                EngineActivity::Seeding
            }
            EngineActivity::QueuedForChecking
            | EngineActivity::CheckingFiles
            | EngineActivity::CheckingResumeData => EngineActivity::Downloading,
            other => other,
        };
        if self.is_complete() && self.completed_at.is_none() {
            self.completed_at = Some(Utc::now());
        }
    }

    fn status(&self, download_limit: u64, upload_limit: u64) -> EngineStatus {
        let (download_rate, upload_rate) = if self.paused {
            (0, 0)
        } else {
            (
                capped(self.download_rate, download_limit),
                capped(self.upload_rate, upload_limit),
            )
        };
        EngineStatus {
            info_hash: self.info_hash,
            name: self.name.clone(),
            save_path: self.save_path.clone(),
            total_wanted: self.total_wanted,
            total_wanted_done: self.downloaded,
            total_uploaded: self.uploaded,
            progress: fraction(self.downloaded, self.total_wanted),
            download_rate,
            upload_rate,
            num_peers: u32::try_from(self.peers.len()).unwrap_or(u32::MAX),
            num_seeds: u32::try_from(
                self.peers
                    .iter()
                    .filter(|peer| peer.progress >= 1.0)
                    .count(),
            )
            .unwrap_or(u32::MAX),
            added_at: self.added_at,
            completed_at: self.completed_at,
            activity: self.activity,
            paused: self.paused,
            auto_managed: self.auto_managed,
            error: self.error.clone(),
            has_metadata: self.has_metadata,
        }
    }

    fn resume_blob(&self) -> ResumeBlob {
        ResumeBlob {
            format: RESUME_FORMAT.to_string(),
            version: RESUME_VERSION,
            info_hash: self.info_hash,
            name: self.name.clone(),
            save_path: self.save_path.clone(),
            paused: self.paused,
            auto_managed: self.auto_managed,
            added_at: self.added_at,
            completed_at: self.completed_at,
            has_metadata: self.has_metadata,
            total_wanted: self.total_wanted,
            downloaded: self.downloaded,
            uploaded: self.uploaded,
            trackers: self.trackers.clone(),
            files: self
                .files
                .iter()
                .map(|file| ResumeFile {
                    path: file.path.clone(),
                    length: file.length,
                })
                .collect(),
            metainfo: self.metainfo.as_ref().map(|raw| STANDARD.encode(raw)),
        }
    }

    fn encode_resume(&self) -> TorrentResult<Vec<u8>> {
        serde_json::to_vec(&self.resume_blob()).map_err(|source| {
            op_failed(
                "export_resume_state",
                Some(self.info_hash),
                EngineError::ResumeEncode {
                    info_hash: self.info_hash,
                    source,
                },
            )
        })
    }

    fn tracker_status(&self, url: &str) -> (TrackerStatus, String) {
        if let Some(message) = self.tracker_errors.get(url) {
            return (TrackerStatus::Error, message.clone());
        }
        let announcing = !self.paused
            && matches!(
                self.activity,
                EngineActivity::DownloadingMetadata
                    | EngineActivity::Downloading
                    | EngineActivity::Finished
                    | EngineActivity::Seeding
            );
        if announcing {
            (TrackerStatus::Working, String::new())
        } else {
            (TrackerStatus::NotContacted, String::new())
        }
    }
}

impl MemoryState {
    fn torrent(&self, handle: EngineHandle) -> TorrentResult<&MemoryTorrent> {
        self.torrents
            .get(&handle)
            .ok_or(TorrentError::InvalidHandle { handle })
    }

    fn torrent_mut(&mut self, handle: EngineHandle) -> TorrentResult<&mut MemoryTorrent> {
        self.torrents
            .get_mut(&handle)
            .ok_or(TorrentError::InvalidHandle { handle })
    }

    fn handle_of(&self, info_hash: InfoHash) -> Option<EngineHandle> {
        self.torrents
            .iter()
            .find(|(_, torrent)| torrent.info_hash == info_hash)
            .map(|(handle, _)| *handle)
    }

    fn admit(&mut self, torrent: MemoryTorrent) -> TorrentResult<EngineHandle> {
        let info_hash = torrent.info_hash;
        if self.handle_of(info_hash).is_some() {
            return Err(TorrentError::DuplicateTorrent { info_hash });
        }
        self.next_handle += 1;
        let handle = EngineHandle::new(self.next_handle);
        debug!(info_hash = %info_hash, handle = %handle, "torrent admitted");
        self.torrents.insert(handle, torrent);
        self.events
            .push(EngineEvent::AddConfirmed { handle, info_hash });
        Ok(handle)
    }
}

impl MemoryEngine {
    /// Create a controller with no running session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Session factory bound to this controller's state.
    #[must_use]
    pub fn factory(&self) -> SessionFactory {
        let state = Arc::clone(&self.state);
        Box::new(move |config: &EngineRuntimeConfig| {
            let session = MemorySession::start(Arc::clone(&state), config)?;
            Ok(Box::new(session) as Box<dyn EngineSession>)
        })
    }

    /// Whether a session currently holds the listener.
    #[must_use]
    pub fn is_running(&self) -> bool {
        lock(&self.state).listen_addr.is_some()
    }

    /// Bound listener address of the running session.
    #[must_use]
    pub fn listen_addr(&self) -> Option<SocketAddr> {
        lock(&self.state).listen_addr
    }

    /// Number of sessions started through the factory.
    #[must_use]
    pub fn sessions_started(&self) -> usize {
        lock(&self.state).sessions_started
    }

    /// Session limits in bytes per second.
    #[must_use]
    pub fn rate_limits(&self) -> (u64, u64) {
        let state = lock(&self.state);
        (state.download_limit, state.upload_limit)
    }

    /// Memory preset last applied.
    #[must_use]
    pub fn memory_profile(&self) -> MemoryProfile {
        lock(&self.state).memory_profile
    }

    /// Engine-side status for a torrent, live or left over from a stopped session.
    #[must_use]
    pub fn status_of(&self, info_hash: InfoHash) -> Option<EngineStatus> {
        let state = lock(&self.state);
        state
            .torrents
            .values()
            .find(|torrent| torrent.info_hash == info_hash)
            .map(|torrent| torrent.status(state.download_limit, state.upload_limit))
    }

    /// Tracker URLs attached to a torrent.
    #[must_use]
    pub fn trackers_of(&self, info_hash: InfoHash) -> Vec<String> {
        lock(&self.state)
            .torrents
            .values()
            .find(|torrent| torrent.info_hash == info_hash)
            .map(|torrent| torrent.trackers.clone())
            .unwrap_or_default()
    }

    /// Removals requested through the session, with their delete-files flag.
    #[must_use]
    pub fn removals(&self) -> Vec<(InfoHash, bool)> {
        lock(&self.state).removals.clone()
    }

    /// Inject transfer counters. Returns `false` when the torrent is unknown.
    pub fn set_transfer(&self, info_hash: InfoHash, sample: TransferSample) -> bool {
        self.with_torrent(info_hash, |torrent, _, _| {
            torrent.downloaded = sample.downloaded.min(torrent.total_wanted);
            torrent.uploaded = sample.uploaded;
            torrent.download_rate = sample.download_rate;
            torrent.upload_rate = sample.upload_rate;
        })
    }

    /// Complete a magnet's metadata fetch with a single-file layout.
    pub fn deliver_metadata(&self, info_hash: InfoHash, name: &str, total_size: u64) -> bool {
        self.with_torrent(info_hash, |torrent, handle, events| {
            torrent.name = name.to_string();
            torrent.total_wanted = total_size;
            torrent.files = vec![MetainfoFile {
                path: name.to_string(),
                length: total_size,
            }];
            torrent.has_metadata = true;
            if matches!(
                torrent.activity,
                EngineActivity::QueuedForChecking | EngineActivity::DownloadingMetadata
            ) {
                torrent.activity = EngineActivity::Downloading;
            }
            events.push(EngineEvent::MetadataReceived { handle, info_hash });
        })
    }

    /// Flag a torrent error and queue the matching event.
    pub fn raise_torrent_error(&self, info_hash: InfoHash, message: &str) -> bool {
        self.with_torrent(info_hash, |torrent, handle, events| {
            torrent.error = Some(message.to_string());
            events.push(EngineEvent::TorrentError {
                handle,
                info_hash,
                name: torrent.name.clone(),
                message: message.to_string(),
            });
        })
    }

    /// Clear a torrent error, as the engine does once the condition resolves.
    pub fn clear_torrent_error(&self, info_hash: InfoHash) -> bool {
        self.with_torrent(info_hash, |torrent, _, _| torrent.error = None)
    }

    /// Queue a file error event.
    pub fn raise_file_error(&self, info_hash: InfoHash, file: &str, message: &str) -> bool {
        self.with_torrent(info_hash, |_, handle, events| {
            events.push(EngineEvent::FileError {
                handle,
                info_hash,
                file: file.to_string(),
                message: message.to_string(),
            });
        })
    }

    /// Mark a tracker as failing and queue the matching event.
    pub fn raise_tracker_error(&self, info_hash: InfoHash, url: &str, message: &str) -> bool {
        self.with_torrent(info_hash, |torrent, handle, events| {
            torrent
                .tracker_errors
                .insert(url.to_string(), message.to_string());
            events.push(EngineEvent::TrackerError {
                handle,
                info_hash,
                url: url.to_string(),
                message: message.to_string(),
            });
        })
    }

    /// Queue an asynchronous add failure.
    pub fn raise_add_failure(&self, info_hash: Option<InfoHash>, message: &str) {
        lock(&self.state).events.push(EngineEvent::AddFailed {
            info_hash,
            message: message.to_string(),
        });
    }

    /// Make subsequent resume-data requests for a torrent fail.
    pub fn fail_resume_data(&self, info_hash: InfoHash) {
        lock(&self.state).failing_resume.insert(info_hash);
    }

    /// Replace the connected peer list.
    pub fn set_peers(&self, info_hash: InfoHash, peers: Vec<PeerInfo>) -> bool {
        self.with_torrent(info_hash, |torrent, _, _| torrent.peers = peers)
    }

    /// Admit a torrent without a gateway command, as an engine-side watch folder would.
    ///
    /// # Errors
    ///
    /// Returns [`TorrentError::DuplicateTorrent`] when the content is already present.
    pub fn admit_external(&self, params: AddTorrentParams) -> TorrentResult<EngineHandle> {
        lock(&self.state).admit(MemoryTorrent::from_params(params))
    }

    /// Drop a torrent without any command, as an engine-internal fault would.
    pub fn drop_torrent(&self, info_hash: InfoHash) -> bool {
        let mut state = lock(&self.state);
        match state.handle_of(info_hash) {
            Some(handle) => state.torrents.remove(&handle).is_some(),
            None => false,
        }
    }

    fn with_torrent<F>(&self, info_hash: InfoHash, apply: F) -> bool
    where
        F: FnOnce(&mut MemoryTorrent, EngineHandle, &mut Vec<EngineEvent>),
    {
        let mut guard = lock(&self.state);
        let MemoryState {
            torrents, events, ..
        } = &mut *guard;
        match torrents
            .iter_mut()
            .find(|(_, torrent)| torrent.info_hash == info_hash)
        {
            Some((handle, torrent)) => {
                apply(torrent, *handle, events);
                true
            }
            None => false,
        }
    }
}

struct MemorySession {
    state: Arc<Mutex<MemoryState>>,
    _listener: TcpListener,
}

impl MemorySession {
    fn start(state: Arc<Mutex<MemoryState>>, config: &EngineRuntimeConfig) -> TorrentResult<Self> {
        let endpoint = config.listen_endpoint();
        let listener = TcpListener::bind(endpoint.as_str())
            .map_err(|source| TorrentError::startup(EngineError::Bind { endpoint, source }))?;
        let local_addr = listener.local_addr().ok();
        {
            let mut guard = lock(&state);
            guard.torrents.clear();
            guard.events.clear();
            guard.removals.clear();
            guard.download_limit = config.download_rate_limit;
            guard.upload_limit = config.upload_rate_limit;
            guard.memory_profile = config.memory_profile;
            guard.listen_addr = local_addr;
            guard.sessions_started += 1;
        }
        info!(
            listen = ?local_addr,
            user_agent = %config.user_agent,
            max_connections = config.max_connections,
            dht = config.enable_dht.is_enabled(),
            "in-memory engine session started"
        );
        Ok(Self {
            state,
            _listener: listener,
        })
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        lock(&self.state)
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.state().listen_addr = None;
    }
}

impl EngineSession for MemorySession {
    fn add_torrent(&mut self, params: AddTorrentParams) -> TorrentResult<EngineHandle> {
        self.state().admit(MemoryTorrent::from_params(params))
    }

    fn add_resumed(&mut self, params: ResumeParams) -> TorrentResult<EngineHandle> {
        let blob = decode_blob(&params.payload, "add_resumed")?;
        let torrent = MemoryTorrent::from_resume(params, blob)?;
        self.state().admit(torrent)
    }

    fn remove(&mut self, handle: EngineHandle, delete_files: bool) -> TorrentResult<()> {
        let mut state = self.state();
        let torrent = state
            .torrents
            .remove(&handle)
            .ok_or(TorrentError::InvalidHandle { handle })?;
        state.removals.push((torrent.info_hash, delete_files));
        Ok(())
    }

    fn set_paused(&mut self, handle: EngineHandle, paused: bool) -> TorrentResult<()> {
        self.state().torrent_mut(handle)?.paused = paused;
        Ok(())
    }

    fn set_auto_managed(
        &mut self,
        handle: EngineHandle,
        auto_managed: bool,
    ) -> TorrentResult<()> {
        self.state().torrent_mut(handle)?.auto_managed = auto_managed;
        Ok(())
    }

    fn set_rate_limits(&mut self, download_bps: u64, upload_bps: u64) {
        let mut state = self.state();
        state.download_limit = download_bps;
        state.upload_limit = upload_bps;
    }

    fn apply_memory_profile(&mut self, profile: MemoryProfile) {
        self.state().memory_profile = profile;
    }

    fn handles(&self) -> Vec<EngineHandle> {
        self.state().torrents.keys().copied().collect()
    }

    fn status(&self, handle: EngineHandle) -> TorrentResult<EngineStatus> {
        let state = self.state();
        let torrent = state.torrent(handle)?;
        Ok(torrent.status(state.download_limit, state.upload_limit))
    }

    fn pop_events(&mut self) -> Vec<EngineEvent> {
        let mut state = self.state();
        for torrent in state.torrents.values_mut() {
            torrent.advance();
        }
        std::mem::take(&mut state.events)
    }

    fn request_resume_data(&mut self, handle: EngineHandle) -> TorrentResult<()> {
        let mut state = self.state();
        let torrent = state.torrent(handle)?;
        let info_hash = torrent.info_hash;
        let event = if state.failing_resume.contains(&info_hash) {
            EngineEvent::ResumeDataFailed {
                handle,
                info_hash,
                message: "resume data unavailable".to_string(),
            }
        } else {
            EngineEvent::ResumeDataReady {
                handle,
                info_hash,
                payload: torrent.encode_resume()?,
            }
        };
        state.events.push(event);
        Ok(())
    }

    fn export_resume_state(&self, handle: EngineHandle) -> TorrentResult<Vec<u8>> {
        self.state().torrent(handle)?.encode_resume()
    }

    fn import_resume_state(&self, bytes: &[u8]) -> TorrentResult<ResumeParams> {
        let blob = decode_blob(bytes, "import_resume_state")?;
        Ok(ResumeParams {
            info_hash: blob.info_hash,
            name: blob.name,
            save_path: blob.save_path,
            paused: blob.paused,
            auto_managed: blob.auto_managed,
            payload: bytes.to_vec(),
        })
    }

    fn trackers(&self, handle: EngineHandle) -> TorrentResult<Vec<TrackerInfo>> {
        let state = self.state();
        let torrent = state.torrent(handle)?;
        Ok(torrent
            .trackers
            .iter()
            .enumerate()
            .map(|(index, url)| {
                let (status, message) = torrent.tracker_status(url);
                TrackerInfo {
                    url: url.clone(),
                    tier: u8::try_from(index).unwrap_or(u8::MAX),
                    status,
                    message,
                }
            })
            .collect())
    }

    fn peers(&self, handle: EngineHandle) -> TorrentResult<Vec<PeerInfo>> {
        Ok(self.state().torrent(handle)?.peers.clone())
    }

    fn files(&self, handle: EngineHandle) -> TorrentResult<Vec<FileInfo>> {
        let state = self.state();
        let torrent = state.torrent(handle)?;
        let mut remaining = torrent.downloaded;
        Ok(torrent
            .files
            .iter()
            .map(|file| {
                let have = remaining.min(file.length);
                remaining -= have;
                FileInfo {
                    path: file.path.clone(),
                    size: file.length,
                    progress: if file.length == 0 {
                        1.0
                    } else {
                        fraction(have, file.length)
                    },
                    priority: DEFAULT_FILE_PRIORITY,
                }
            })
            .collect())
    }

    fn add_trackers(&mut self, handle: EngineHandle, urls: &[String]) -> TorrentResult<()> {
        let mut state = self.state();
        let torrent = state.torrent_mut(handle)?;
        for url in urls {
            if !torrent.trackers.contains(url) {
                torrent.trackers.push(url.clone());
            }
        }
        Ok(())
    }
}

fn decode_blob(bytes: &[u8], operation: &'static str) -> TorrentResult<ResumeBlob> {
    let blob: ResumeBlob =
        serde_json::from_slice(bytes).map_err(|err| TorrentError::ResumeData {
            operation,
            reason: err.to_string(),
        })?;
    if blob.format != RESUME_FORMAT || blob.version != RESUME_VERSION {
        return Err(TorrentError::ResumeData {
            operation,
            reason: format!("unsupported resume format {} v{}", blob.format, blob.version),
        });
    }
    Ok(blob)
}
