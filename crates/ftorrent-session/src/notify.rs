//! Caller-registered notification slots.
//!
//! Each slot holds at most one handler. Handlers are cloned out of their slot
//! before being invoked, so a handler may call back into the coordinator or
//! replace handlers without deadlocking.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use ftorrent_torrent_core::{InfoHash, TorrentRecord};

use crate::stats::SessionStats;

/// Error surfaced to the caller, with the torrent it concerns when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    /// Torrent the error refers to.
    pub torrent: Option<InfoHash>,
    /// Human-readable message.
    pub message: String,
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Slot<T: ?Sized> {
    handler: Mutex<Option<Handler<T>>>,
}

impl<T: ?Sized> Default for Slot<T> {
    fn default() -> Self {
        Self {
            handler: Mutex::new(None),
        }
    }
}

impl<T: ?Sized> Slot<T> {
    fn set(&self, handler: Handler<T>) {
        *self.handler.lock().unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    fn invoke(&self, value: &T) {
        let handler = self
            .handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(handler) = handler {
            handler(value);
        }
    }
}

/// A notification produced while the coordinator lock was held.
#[derive(Debug, Clone)]
pub(crate) enum Notification {
    Added(TorrentRecord),
    Removed(TorrentRecord),
    Updated(TorrentRecord),
    Stats(SessionStats),
    Error(ErrorReport),
}

/// The five caller notification slots.
#[derive(Default)]
pub(crate) struct NotificationHub {
    added: Slot<TorrentRecord>,
    removed: Slot<TorrentRecord>,
    updated: Slot<TorrentRecord>,
    stats: Slot<SessionStats>,
    error: Slot<ErrorReport>,
}

impl fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationHub").finish_non_exhaustive()
    }
}

impl NotificationHub {
    /// Fired once when a torrent becomes tracked.
    pub fn on_added(&self, handler: impl Fn(&TorrentRecord) + Send + Sync + 'static) {
        self.added.set(Arc::new(handler));
    }

    /// Fired once when a torrent stops being tracked, with its final snapshot.
    pub fn on_removed(&self, handler: impl Fn(&TorrentRecord) + Send + Sync + 'static) {
        self.removed.set(Arc::new(handler));
    }

    /// Fired for every tracked torrent on each refresh.
    pub fn on_updated(&self, handler: impl Fn(&TorrentRecord) + Send + Sync + 'static) {
        self.updated.set(Arc::new(handler));
    }

    /// Fired once per update cycle with aggregate counters.
    pub fn on_stats_updated(&self, handler: impl Fn(&SessionStats) + Send + Sync + 'static) {
        self.stats.set(Arc::new(handler));
    }

    /// Fired for torrent, file, and add failures reported by the engine.
    pub fn on_error(&self, handler: impl Fn(&ErrorReport) + Send + Sync + 'static) {
        self.error.set(Arc::new(handler));
    }

    pub(crate) fn dispatch(&self, notifications: Vec<Notification>) {
        for notification in notifications {
            match notification {
                Notification::Added(record) => self.added.invoke(&record),
                Notification::Removed(record) => self.removed.invoke(&record),
                Notification::Updated(record) => self.updated.invoke(&record),
                Notification::Stats(stats) => self.stats.invoke(&stats),
                Notification::Error(report) => self.error.invoke(&report),
            }
        }
    }
}
