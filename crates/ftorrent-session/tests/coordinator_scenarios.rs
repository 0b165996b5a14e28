use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::thread;
use std::time::Duration;

use ftorrent_session::{
    CoordinatorOptions, ErrorReport, FastResumeStore, PersistenceMode, PersistenceStore,
    SessionCoordinator, SessionStats, StaticTrackers, StoreError, StoreResult,
};
use ftorrent_test_support::fixtures::{FIXTURE_ANNOUNCE, TorrentFixture, magnet_uri};
use ftorrent_torrent_core::{
    InfoHash, TorrentError, TorrentRecord, TorrentState, TrackerStatus,
};
use ftorrent_torrent_engine::{
    AddSource, AddTorrentParams, EngineRuntimeConfig, MagnetLink, MemoryEngine, MemoryProfile,
    TransferSample,
};

fn local_config() -> EngineRuntimeConfig {
    EngineRuntimeConfig {
        listen_interface: "127.0.0.1".into(),
        listen_port: 0,
        ..EngineRuntimeConfig::default()
    }
}

fn inline_options() -> CoordinatorOptions {
    CoordinatorOptions {
        checkpoint_interval: Duration::ZERO,
        persistence: PersistenceMode::Inline,
        restore_paused_state: true,
    }
}

#[derive(Default)]
struct Recorder {
    added: Mutex<Vec<TorrentRecord>>,
    removed: Mutex<Vec<TorrentRecord>>,
    errors: Mutex<Vec<ErrorReport>>,
    stats: Mutex<Vec<SessionStats>>,
}

impl Recorder {
    fn attach(coordinator: &SessionCoordinator) -> Arc<Self> {
        let recorder = Arc::new(Self::default());
        let sink = Arc::clone(&recorder);
        coordinator.on_added(move |record| push(&sink.added, record.clone()));
        let sink = Arc::clone(&recorder);
        coordinator.on_removed(move |record| push(&sink.removed, record.clone()));
        let sink = Arc::clone(&recorder);
        coordinator.on_error(move |report| push(&sink.errors, report.clone()));
        let sink = Arc::clone(&recorder);
        coordinator.on_stats_updated(move |stats| push(&sink.stats, *stats));
        recorder
    }

    fn added(&self) -> Vec<TorrentRecord> {
        snapshot(&self.added)
    }

    fn removed(&self) -> Vec<TorrentRecord> {
        snapshot(&self.removed)
    }

    fn errors(&self) -> Vec<ErrorReport> {
        snapshot(&self.errors)
    }

    fn stats(&self) -> Vec<SessionStats> {
        snapshot(&self.stats)
    }
}

fn push<T>(slot: &Mutex<Vec<T>>, value: T) {
    slot.lock().unwrap_or_else(PoisonError::into_inner).push(value);
}

fn snapshot<T: Clone>(slot: &Mutex<Vec<T>>) -> Vec<T> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Store whose saves take a while, so the background queue backs up.
struct SlowStore {
    inner: FastResumeStore,
    save_delay: Duration,
}

impl PersistenceStore for SlowStore {
    fn save(&self, info_hash: InfoHash, bytes: &[u8]) -> StoreResult<()> {
        if !self.save_delay.is_zero() {
            thread::sleep(self.save_delay);
        }
        self.inner.save(info_hash, bytes)
    }

    fn load(&self, info_hash: InfoHash) -> StoreResult<Vec<u8>> {
        self.inner.load(info_hash)
    }

    fn delete(&self, info_hash: InfoHash) -> StoreResult<()> {
        self.inner.delete(info_hash)
    }

    fn load_all(&self) -> StoreResult<Vec<(InfoHash, Vec<u8>)>> {
        self.inner.load_all()
    }
}

struct Harness {
    engine: MemoryEngine,
    coordinator: SessionCoordinator,
    recorder: Arc<Recorder>,
    store: FastResumeStore,
    dir: tempfile::TempDir,
}

impl Harness {
    fn start(options: CoordinatorOptions) -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        Self::start_in(dir, options)
    }

    fn start_in(dir: tempfile::TempDir, options: CoordinatorOptions) -> anyhow::Result<Self> {
        Self::start_with_save_delay(dir, options, Duration::ZERO)
    }

    fn start_with_save_delay(
        dir: tempfile::TempDir,
        options: CoordinatorOptions,
        save_delay: Duration,
    ) -> anyhow::Result<Self> {
        let engine = MemoryEngine::new();
        let store = FastResumeStore::new(dir.path().join("resume"));
        let slow = SlowStore {
            inner: store.clone(),
            save_delay,
        };
        let coordinator = SessionCoordinator::new(engine.factory(), options).with_store(slow);
        let recorder = Recorder::attach(&coordinator);
        coordinator.initialize(&local_config())?;
        Ok(Self {
            engine,
            coordinator,
            recorder,
            store,
            dir,
        })
    }

    fn add_file(&self, name: &str, length: u64) -> anyhow::Result<InfoHash> {
        let path = TorrentFixture::new(name, length).write_to(self.dir.path())?;
        Ok(self
            .coordinator
            .add_torrent_file(&path, Path::new("/downloads"))?)
    }

    fn record(&self, info_hash: InfoHash) -> anyhow::Result<TorrentRecord> {
        self.coordinator
            .get_torrent(info_hash)
            .ok_or_else(|| anyhow::anyhow!("record {info_hash} missing"))
    }
}

#[test]
fn file_add_is_tracked_within_the_call() -> anyhow::Result<()> {
    let harness = Harness::start(inline_options())?;
    let id = harness.add_file("ubuntu", 4 * 16_384)?;

    let records = harness.coordinator.list_torrents();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, id);
    assert!(matches!(
        records[0].state,
        TorrentState::Queued | TorrentState::Checking
    ));
    assert!(records[0].progress.abs() < f64::EPSILON);
    assert_eq!(harness.recorder.added().len(), 1);
    Ok(())
}

#[test]
fn pause_is_visible_without_another_update() -> anyhow::Result<()> {
    let harness = Harness::start(inline_options())?;
    let id = harness.add_file("ubuntu", 4 * 16_384)?;
    harness.coordinator.update()?;
    assert_eq!(harness.record(id)?.state, TorrentState::Downloading);

    harness.coordinator.pause_torrent(id)?;
    assert_eq!(harness.record(id)?.state, TorrentState::Paused);
    let status = harness
        .engine
        .status_of(id)
        .ok_or_else(|| anyhow::anyhow!("engine lost torrent"))?;
    assert!(status.paused && !status.auto_managed);

    harness.coordinator.resume_torrent(id)?;
    assert_ne!(harness.record(id)?.state, TorrentState::Paused);
    Ok(())
}

#[test]
fn torrent_error_is_reported_once_and_record_stays() -> anyhow::Result<()> {
    let harness = Harness::start(inline_options())?;
    let id = harness.add_file("ubuntu", 4 * 16_384)?;
    harness.coordinator.update()?;

    assert!(harness.engine.raise_torrent_error(id, "disk full"));
    harness.coordinator.update()?;
    harness.coordinator.update()?;

    let errors = harness.recorder.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].torrent, Some(id));
    assert_eq!(errors[0].message, "Torrent error [ubuntu]: disk full");
    let record = harness.record(id)?;
    assert_eq!(record.state, TorrentState::Error);
    assert_eq!(record.error.as_deref(), Some("disk full"));
    Ok(())
}

#[test]
fn file_errors_use_their_own_message_shape() -> anyhow::Result<()> {
    let harness = Harness::start(inline_options())?;
    let id = harness.add_file("ubuntu", 4 * 16_384)?;
    assert!(harness.engine.raise_file_error(id, "ubuntu/disk.img", "permission denied"));
    harness.engine.raise_add_failure(None, "bad torrent");
    harness.coordinator.update()?;

    let messages: Vec<String> = harness
        .recorder
        .errors()
        .into_iter()
        .map(|report| report.message)
        .collect();
    assert_eq!(
        messages,
        vec![
            "File error: ubuntu/disk.img - permission denied".to_string(),
            "Failed to add torrent: bad torrent".to_string()
        ]
    );
    Ok(())
}

#[test]
fn remove_fires_once_and_deletes_the_blob() -> anyhow::Result<()> {
    let harness = Harness::start(inline_options())?;
    let id = harness.add_file("ubuntu", 4 * 16_384)?;
    harness.coordinator.update()?;
    harness.coordinator.update()?;
    assert!(!harness.store.load(id)?.is_empty());

    harness.coordinator.remove_torrent(id, true)?;
    harness.coordinator.remove_torrent(id, true)?;

    let removed = harness.recorder.removed();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].id, id);
    assert!(harness.coordinator.get_torrent(id).is_none());
    assert!(matches!(
        harness.store.load(id),
        Err(StoreError::NotFound { .. })
    ));
    assert_eq!(harness.engine.removals(), vec![(id, true)]);
    Ok(())
}

#[test]
fn late_resume_data_does_not_resurrect_a_removed_torrent() -> anyhow::Result<()> {
    let harness = Harness::start(inline_options())?;
    let id = harness.add_file("ubuntu", 4 * 16_384)?;
    // AddConfirmed is handled here and queues a resume export.
    harness.coordinator.update()?;
    harness.coordinator.remove_torrent(id, false)?;
    harness.coordinator.update()?;

    assert!(harness.store.load_all()?.is_empty());
    Ok(())
}

#[test]
fn total_rates_sum_file_and_magnet_torrents() -> anyhow::Result<()> {
    let harness = Harness::start(inline_options())?;
    let file_id = harness.add_file("ubuntu", 4 * 16_384)?;
    let magnet = magnet_uri(&"ab".repeat(20), Some("debian"));
    let magnet_id = harness
        .coordinator
        .add_magnet_link(&magnet, Path::new("/downloads"))?;
    assert_ne!(file_id, magnet_id);

    for (id, down, up) in [(file_id, 4_096, 100), (magnet_id, 1_024, 0)] {
        assert!(harness.engine.set_transfer(
            id,
            TransferSample {
                download_rate: down,
                upload_rate: up,
                ..TransferSample::default()
            }
        ));
    }
    harness.coordinator.update()?;

    let records = harness.coordinator.list_torrents();
    let down: u64 = records.iter().map(|record| record.download_rate).sum();
    let up: u64 = records.iter().map(|record| record.upload_rate).sum();
    assert_eq!(harness.coordinator.total_download_rate(), down);
    assert_eq!(harness.coordinator.total_upload_rate(), up);
    assert_eq!(down, 5_120);
    assert_eq!(harness.coordinator.active_count(), 2);

    let stats = harness.recorder.stats();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].torrents, 2);
    assert_eq!(stats[0].download_rate, 5_120);
    Ok(())
}

#[test]
fn list_is_ordered_by_name() -> anyhow::Result<()> {
    let harness = Harness::start(inline_options())?;
    harness.add_file("zeta", 16_384)?;
    harness.add_file("alpha", 16_384)?;
    harness.add_file("mid", 16_384)?;

    let names: Vec<String> = harness
        .coordinator
        .list_torrents()
        .into_iter()
        .map(|record| record.name)
        .collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    assert_eq!(harness.coordinator.count(), 3);
    Ok(())
}

#[test]
fn restart_restores_torrents_and_explicit_pause() -> anyhow::Result<()> {
    let harness = Harness::start(inline_options())?;
    let running = harness.add_file("running", 4 * 16_384)?;
    let paused = harness.add_file("paused", 4 * 16_384)?;
    harness.coordinator.pause_torrent(paused)?;
    assert_eq!(harness.coordinator.save_all_resume_data()?, 2);
    harness.coordinator.shutdown();

    let Harness { dir, .. } = harness;
    let restarted = Harness::start_in(dir, inline_options())?;
    assert_eq!(restarted.recorder.added().len(), 2);
    restarted.coordinator.update()?;
    assert_eq!(restarted.record(paused)?.state, TorrentState::Paused);
    assert_ne!(restarted.record(running)?.state, TorrentState::Paused);
    Ok(())
}

#[test]
fn restart_can_resume_everything() -> anyhow::Result<()> {
    let harness = Harness::start(inline_options())?;
    let paused = harness.add_file("paused", 4 * 16_384)?;
    harness.coordinator.pause_torrent(paused)?;
    harness.coordinator.save_all_resume_data()?;
    harness.coordinator.shutdown();

    let Harness { dir, .. } = harness;
    let options = CoordinatorOptions {
        restore_paused_state: false,
        ..inline_options()
    };
    let restarted = Harness::start_in(dir, options)?;
    restarted.coordinator.update()?;
    assert_ne!(restarted.record(paused)?.state, TorrentState::Paused);
    Ok(())
}

#[test]
fn unreadable_blobs_are_skipped_on_restore() -> anyhow::Result<()> {
    let harness = Harness::start(inline_options())?;
    let good = harness.add_file("good", 16_384)?;
    harness.coordinator.save_all_resume_data()?;
    harness.coordinator.shutdown();
    harness
        .store
        .save(InfoHash::from_bytes([7; 20]), b"not resume data")?;

    let Harness { dir, .. } = harness;
    let restarted = Harness::start_in(dir, inline_options())?;
    assert_eq!(restarted.coordinator.count(), 1);
    assert!(restarted.coordinator.get_torrent(good).is_some());
    Ok(())
}

#[test]
fn background_writer_lands_final_checkpoint() -> anyhow::Result<()> {
    let options = CoordinatorOptions {
        persistence: PersistenceMode::Background { queue_depth: 4 },
        ..inline_options()
    };
    let harness = Harness::start(options)?;
    let id = harness.add_file("ubuntu", 16_384)?;
    assert_eq!(harness.coordinator.save_all_resume_data()?, 1);
    assert!(!harness.store.load(id)?.is_empty());

    harness.coordinator.remove_torrent(id, false)?;
    harness.coordinator.shutdown();
    assert!(harness.store.load_all()?.is_empty());
    Ok(())
}

#[test]
fn vanished_torrent_is_dropped_with_notification() -> anyhow::Result<()> {
    let harness = Harness::start(inline_options())?;
    let id = harness.add_file("ubuntu", 16_384)?;
    assert!(harness.engine.drop_torrent(id));
    harness.coordinator.update()?;

    assert_eq!(harness.coordinator.count(), 0);
    let removed = harness.recorder.removed();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].id, id);
    Ok(())
}

#[test]
fn unknown_ids_are_not_found_for_toggles() -> anyhow::Result<()> {
    let harness = Harness::start(inline_options())?;
    let unknown = InfoHash::from_bytes([9; 20]);
    assert!(matches!(
        harness.coordinator.pause_torrent(unknown),
        Err(TorrentError::NotFound { info_hash }) if info_hash == unknown
    ));
    assert!(matches!(
        harness.coordinator.torrent_details(unknown),
        Err(TorrentError::NotFound { .. })
    ));
    harness.coordinator.remove_torrent(unknown, false)?;
    assert!(harness.recorder.removed().is_empty());
    Ok(())
}

#[test]
fn commands_fail_after_shutdown() -> anyhow::Result<()> {
    let harness = Harness::start(inline_options())?;
    let id = harness.add_file("ubuntu", 16_384)?;
    harness.coordinator.shutdown();
    harness.coordinator.shutdown();

    assert!(!harness.coordinator.is_initialized());
    assert!(matches!(
        harness.coordinator.update(),
        Err(TorrentError::NotInitialized)
    ));
    assert!(matches!(
        harness.coordinator.remove_torrent(id, false),
        Err(TorrentError::NotInitialized)
    ));
    assert!(matches!(
        harness.coordinator.set_throttled(true),
        Err(TorrentError::NotInitialized)
    ));
    assert_eq!(harness.coordinator.count(), 0);
    Ok(())
}

#[test]
fn second_initialize_is_a_no_op() -> anyhow::Result<()> {
    let harness = Harness::start(inline_options())?;
    harness.add_file("ubuntu", 16_384)?;
    harness.coordinator.initialize(&local_config())?;
    assert_eq!(harness.engine.sessions_started(), 1);
    assert_eq!(harness.coordinator.count(), 1);
    Ok(())
}

#[test]
fn throttle_halves_limits_and_restores_them() -> anyhow::Result<()> {
    let harness = Harness::start(inline_options())?;
    harness.coordinator.set_rate_limits(800, 400)?;
    assert_eq!(harness.engine.rate_limits(), (800 * 1024, 400 * 1024));

    harness.coordinator.set_throttled(true)?;
    assert_eq!(harness.engine.rate_limits(), (400 * 1024, 200 * 1024));

    harness.coordinator.set_rate_limits(0, 0)?;
    assert_eq!(harness.engine.rate_limits(), (1_000 * 1024, 200 * 1024));

    harness.coordinator.set_throttled(false)?;
    assert_eq!(harness.engine.rate_limits(), (0, 0));
    Ok(())
}

#[test]
fn confirmed_adds_gain_augmented_trackers() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let engine = MemoryEngine::new();
    let coordinator = SessionCoordinator::new(engine.factory(), inline_options())
        .with_tracker_augmentation(StaticTrackers::new(["udp://extra.example:1337/announce"]));
    coordinator.initialize(&local_config())?;
    let path = TorrentFixture::new("ubuntu", 16_384).write_to(dir.path())?;
    let id = coordinator.add_torrent_file(&path, dir.path())?;
    coordinator.update()?;

    assert!(
        engine
            .trackers_of(id)
            .contains(&"udp://extra.example:1337/announce".to_string())
    );
    Ok(())
}

#[test]
fn handlers_can_call_back_into_the_coordinator() -> anyhow::Result<()> {
    let engine = MemoryEngine::new();
    let coordinator = Arc::new(SessionCoordinator::new(
        engine.factory(),
        inline_options(),
    ));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let weak: Weak<SessionCoordinator> = Arc::downgrade(&coordinator);
    let log = Arc::clone(&seen);
    coordinator.on_updated(move |record| {
        if let Some(coordinator) = weak.upgrade() {
            let listed = coordinator.get_torrent(record.id).is_some();
            push(&log, listed);
        }
    });
    coordinator.initialize(&local_config())?;
    let dir = tempfile::tempdir()?;
    let path = TorrentFixture::new("ubuntu", 16_384).write_to(dir.path())?;
    coordinator.add_torrent_file(&path, dir.path())?;
    coordinator.update()?;

    assert_eq!(snapshot(&seen), vec![true]);
    Ok(())
}

#[test]
fn magnet_records_fill_in_after_metadata() -> anyhow::Result<()> {
    let harness = Harness::start(inline_options())?;
    let hash_hex = "cd".repeat(20);
    let id = harness
        .coordinator
        .add_magnet_link(&magnet_uri(&hash_hex, None), Path::new("/downloads"))?;
    let record = harness.record(id)?;
    assert_eq!(record.state, TorrentState::Queued);
    assert!(!record.has_metadata);

    assert!(harness.engine.deliver_metadata(id, "debian.iso", 3 * 16_384));
    harness.coordinator.update()?;
    let record = harness.record(id)?;
    assert_eq!(record.name, "debian.iso");
    assert!(record.has_metadata);
    assert_eq!(record.total_size, 3 * 16_384);

    harness.coordinator.update()?;
    assert!(!harness.store.load(id)?.is_empty());
    Ok(())
}

fn background_options(queue_depth: usize) -> CoordinatorOptions {
    CoordinatorOptions {
        persistence: PersistenceMode::Background { queue_depth },
        ..inline_options()
    }
}

#[test]
fn removed_torrent_stays_gone_when_checkpoints_back_up() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let harness =
        Harness::start_with_save_delay(dir, background_options(2), Duration::from_millis(20))?;
    let mut ids = Vec::new();
    for index in 0..8 {
        ids.push(harness.add_file(&format!("bulk-{index}"), 16_384)?);
    }
    // The second tick delivers a resume blob per torrent into a queue that is already full.
    harness.coordinator.update()?;
    harness.coordinator.update()?;

    let victim = ids[0];
    harness.coordinator.remove_torrent(victim, true)?;
    harness.coordinator.shutdown();
    assert!(matches!(
        harness.store.load(victim),
        Err(StoreError::NotFound { .. })
    ));

    let Harness { dir, .. } = harness;
    let restarted = Harness::start_in(dir, inline_options())?;
    assert!(restarted.coordinator.get_torrent(victim).is_none());
    Ok(())
}

#[test]
fn final_checkpoint_waits_for_a_slow_store() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let harness =
        Harness::start_with_save_delay(dir, background_options(1), Duration::from_millis(10))?;
    for index in 0..5 {
        harness.add_file(&format!("final-{index}"), 16_384)?;
    }

    assert_eq!(harness.coordinator.save_all_resume_data()?, 5);
    assert_eq!(harness.store.load_all()?.len(), 5);
    Ok(())
}

#[test]
fn removed_record_is_readable_inside_the_handler() -> anyhow::Result<()> {
    let engine = MemoryEngine::new();
    let coordinator = Arc::new(SessionCoordinator::new(
        engine.factory(),
        inline_options(),
    ));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let weak: Weak<SessionCoordinator> = Arc::downgrade(&coordinator);
    let log = Arc::clone(&seen);
    coordinator.on_removed(move |record| {
        if let Some(coordinator) = weak.upgrade() {
            let visible = coordinator.get_torrent(record.id).is_some();
            let count = coordinator.count();
            // A tick run from the handler must not report the removal a second time.
            let ticked = coordinator.update().is_ok();
            push(&log, (visible, count, ticked));
        }
    });
    coordinator.initialize(&local_config())?;
    let dir = tempfile::tempdir()?;
    let path = TorrentFixture::new("ubuntu", 16_384).write_to(dir.path())?;
    let id = coordinator.add_torrent_file(&path, dir.path())?;
    coordinator.update()?;

    coordinator.remove_torrent(id, false)?;
    assert_eq!(snapshot(&seen), vec![(true, 1, true)]);
    assert!(coordinator.get_torrent(id).is_none());
    assert_eq!(coordinator.count(), 0);

    coordinator.update()?;
    assert_eq!(snapshot(&seen).len(), 1);
    Ok(())
}

#[test]
fn pause_all_and_resume_all_refresh_immediately() -> anyhow::Result<()> {
    let harness = Harness::start(inline_options())?;
    let first = harness.add_file("first", 4 * 16_384)?;
    let second = harness.add_file("second", 4 * 16_384)?;
    harness.coordinator.update()?;

    harness.coordinator.pause_all()?;
    for id in [first, second] {
        assert_eq!(harness.record(id)?.state, TorrentState::Paused);
        let status = harness
            .engine
            .status_of(id)
            .ok_or_else(|| anyhow::anyhow!("engine lost torrent"))?;
        assert!(status.paused && !status.auto_managed);
    }
    assert_eq!(harness.coordinator.active_count(), 0);

    harness.coordinator.resume_all()?;
    for id in [first, second] {
        assert_eq!(harness.record(id)?.state, TorrentState::Downloading);
    }
    Ok(())
}

#[test]
fn error_state_clears_when_the_engine_recovers() -> anyhow::Result<()> {
    let harness = Harness::start(inline_options())?;
    let id = harness.add_file("ubuntu", 4 * 16_384)?;
    harness.coordinator.update()?;

    assert!(harness.engine.raise_torrent_error(id, "disk full"));
    harness.coordinator.update()?;
    assert_eq!(harness.record(id)?.state, TorrentState::Error);

    assert!(harness.engine.clear_torrent_error(id));
    harness.coordinator.update()?;
    let record = harness.record(id)?;
    assert_eq!(record.state, TorrentState::Downloading);
    assert!(record.error.is_none());
    assert_eq!(harness.recorder.errors().len(), 1);
    Ok(())
}

#[test]
fn failed_resume_export_is_only_logged() -> anyhow::Result<()> {
    let harness = Harness::start(inline_options())?;
    let id = harness.add_file("ubuntu", 4 * 16_384)?;
    harness.engine.fail_resume_data(id);
    harness.coordinator.update()?;
    harness.coordinator.update()?;

    assert!(harness.recorder.errors().is_empty());
    assert!(harness.coordinator.get_torrent(id).is_some());
    assert!(matches!(
        harness.store.load(id),
        Err(StoreError::NotFound { .. })
    ));
    Ok(())
}

#[test]
fn tracker_errors_stay_out_of_the_error_hook() -> anyhow::Result<()> {
    let harness = Harness::start(inline_options())?;
    let id = harness.add_file("ubuntu", 4 * 16_384)?;
    assert!(
        harness
            .engine
            .raise_tracker_error(id, FIXTURE_ANNOUNCE, "connection timed out")
    );
    harness.coordinator.update()?;

    assert!(harness.recorder.errors().is_empty());
    let details = harness.coordinator.torrent_details(id)?;
    let tracker = details
        .trackers
        .iter()
        .find(|tracker| tracker.url == FIXTURE_ANNOUNCE)
        .ok_or_else(|| anyhow::anyhow!("announce tracker missing"))?;
    assert_eq!(tracker.status, TrackerStatus::Error);
    assert_eq!(tracker.message, "connection timed out");
    assert_ne!(harness.record(id)?.state, TorrentState::Error);
    Ok(())
}

#[test]
fn memory_profile_reaches_the_engine() -> anyhow::Result<()> {
    let harness = Harness::start(inline_options())?;
    assert_eq!(harness.engine.memory_profile(), MemoryProfile::Balanced);
    harness.coordinator.set_memory_profile(MemoryProfile::Eco)?;
    assert_eq!(harness.engine.memory_profile(), MemoryProfile::Eco);
    Ok(())
}

#[test]
fn one_tick_notifies_errors_then_membership_then_updates_then_stats() -> anyhow::Result<()> {
    let harness = Harness::start(inline_options())?;
    let failing = harness.add_file("alpha", 4 * 16_384)?;
    let vanishing = harness.add_file("beta", 4 * 16_384)?;
    harness.coordinator.update()?;

    let order = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&order);
    harness.coordinator.on_error(move |_| push(&log, "error"));
    let log = Arc::clone(&order);
    harness.coordinator.on_added(move |_| push(&log, "added"));
    let log = Arc::clone(&order);
    harness.coordinator.on_removed(move |_| push(&log, "removed"));
    let log = Arc::clone(&order);
    harness.coordinator.on_updated(move |_| push(&log, "updated"));
    let log = Arc::clone(&order);
    harness.coordinator.on_stats_updated(move |_| push(&log, "stats"));

    assert!(harness.engine.raise_torrent_error(failing, "disk full"));
    assert!(harness.engine.drop_torrent(vanishing));
    let magnet = MagnetLink::parse(&magnet_uri(&"ef".repeat(20), Some("gamma")))?;
    harness.engine.admit_external(AddTorrentParams::new(
        AddSource::Magnet(magnet),
        "/downloads",
    ))?;
    harness.coordinator.update()?;

    assert_eq!(
        snapshot(&order),
        vec!["error", "added", "removed", "updated", "updated", "stats"]
    );
    Ok(())
}
