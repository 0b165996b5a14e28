//! Process wiring: settings, logging, the coordinator and its update loop.
//!
//! # Design
//! - `run_app_with` takes every dependency explicitly so tests can drive a full
//!   startup and shutdown cycle against the in-memory engine.
//! - The coordinator is synchronous; the loop only decides when to call
//!   `update` and never holds coordinator state across an await.
//! - Shutdown always ends with a final checkpoint before the engine stops.

use std::future::Future;
use std::path::Path;

use ftorrent_config::{LogFormatSetting, Settings, SettingsLoader};
use ftorrent_session::{FastResumeStore, SessionCoordinator, StaticTrackers};
use ftorrent_telemetry::{LogFormat, LoggingConfig};
use ftorrent_torrent_core::InfoHash;
use ftorrent_torrent_engine::{MemoryEngine, SessionFactory};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::engine_config::SessionPlan;
use crate::error::{AppError, AppResult};

const MAGNET_PREFIX: &str = "magnet:";

/// Dependencies required to run the client.
pub struct BootstrapDependencies {
    /// Validated settings.
    pub settings: Settings,
    /// Torrent files or magnet URIs to add at startup.
    pub sources: Vec<String>,
    /// Engine session factory.
    pub factory: SessionFactory,
    /// Install the global tracing subscriber.
    pub install_logging: bool,
}

impl BootstrapDependencies {
    /// Production dependencies: settings from file and environment, sources
    /// from the command line.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be loaded or fail validation.
    pub fn from_env() -> AppResult<Self> {
        let settings = SettingsLoader::new()
            .load()
            .map_err(|err| AppError::config("settings.load", err))?;
        Ok(Self {
            settings,
            sources: std::env::args().skip(1).collect(),
            factory: MemoryEngine::new().factory(),
            install_logging: true,
        })
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Startup sources that were added.
    pub added: usize,
    /// Resume blobs written by the final checkpoint.
    pub saved: usize,
}

/// Entry point for the binary.
///
/// # Errors
///
/// Returns an error if dependency construction or startup fails.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    let summary = run_app_with(dependencies, ctrl_c()).await?;
    info!(
        added = summary.added,
        saved = summary.saved,
        "ftorrent shut down"
    );
    Ok(())
}

/// Run the client until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if logging cannot be installed or the engine session
/// fails to start. Failures after startup are logged and do not end the run.
pub async fn run_app_with(
    dependencies: BootstrapDependencies,
    shutdown: impl Future<Output = ()>,
) -> AppResult<RunSummary> {
    let BootstrapDependencies {
        settings,
        sources,
        factory,
        install_logging,
    } = dependencies;

    if install_logging {
        let format = settings
            .logging
            .format
            .map_or_else(LogFormat::infer, log_format);
        ftorrent_telemetry::init_logging(&LoggingConfig {
            level: &settings.logging.level,
            format,
            build_sha: ftorrent_telemetry::build_sha(),
        })
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    }

    let plan = SessionPlan::from_settings(&settings);
    info!(
        listen = %plan.runtime.listen_endpoint(),
        resume_dir = %plan.resume_dir.display(),
        "ftorrent starting"
    );

    let mut coordinator = SessionCoordinator::new(factory, plan.options)
        .with_store(FastResumeStore::new(plan.resume_dir.clone()));
    if !plan.extra_trackers.is_empty() {
        coordinator =
            coordinator.with_tracker_augmentation(StaticTrackers::new(plan.extra_trackers.clone()));
    }
    register_log_handlers(&coordinator);

    coordinator
        .initialize(&plan.runtime)
        .map_err(|err| AppError::torrent("coordinator.initialize", err))?;

    let added = sources
        .iter()
        .filter_map(|source| add_source(&coordinator, source, &plan.save_path))
        .count();

    let mut ticker = time::interval(plan.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            _ = ticker.tick() => {
                if let Err(err) = coordinator.update() {
                    warn!(error = %err, "session update failed");
                }
            }
        }
    }

    info!("shutdown requested; writing final checkpoint");
    let saved = match coordinator.save_all_resume_data() {
        Ok(saved) => saved,
        Err(err) => {
            warn!(error = %err, "final checkpoint failed");
            0
        }
    };
    coordinator.shutdown();
    Ok(RunSummary { added, saved })
}

fn add_source(coordinator: &SessionCoordinator, source: &str, save_path: &Path) -> Option<InfoHash> {
    let result = if source.starts_with(MAGNET_PREFIX) {
        coordinator.add_magnet_link(source, save_path)
    } else {
        coordinator.add_torrent_file(Path::new(source), save_path)
    };
    match result {
        Ok(info_hash) => Some(info_hash),
        Err(err) => {
            warn!(source, error = %err, "could not add torrent");
            None
        }
    }
}

fn register_log_handlers(coordinator: &SessionCoordinator) {
    coordinator.on_added(|record| {
        info!(info_hash = %record.id, name = %record.name, "torrent added");
    });
    coordinator.on_removed(|record| {
        info!(info_hash = %record.id, name = %record.name, "torrent removed");
    });
    coordinator.on_updated(|record| {
        debug!(info_hash = %record.id, state = ?record.state, "torrent updated");
    });
    coordinator.on_stats_updated(|stats| {
        debug!(summary = %stats.summary(), "session stats");
    });
    coordinator.on_error(|report| {
        warn!(%report, "session error");
    });
}

const fn log_format(setting: LogFormatSetting) -> LogFormat {
    match setting {
        LogFormatSetting::Json => LogFormat::Json,
        LogFormatSetting::Pretty => LogFormat::Pretty,
    }
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
