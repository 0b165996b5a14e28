//! Off-thread resume-blob persistence.
//!
//! # Design
//! - A single worker thread drains a bounded queue, so saves and deletes for one
//!   torrent land on disk in the order they were submitted.
//! - Periodic saves never block the coordinator; a full queue drops them with a
//!   warning and the next checkpoint covers them.
//! - Deletes and final-checkpoint saves wait for queue room. A dropped delete would
//!   let an earlier queued save bring a removed torrent back on restart.
//! - Shutdown closes the queue and joins the worker, so every accepted job is applied.

use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ftorrent_torrent_core::InfoHash;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::store::PersistenceStore;

/// Default number of queued jobs for the background writer.
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

// Waiting sends may run on a runtime thread, where tokio's blocking send is not allowed.
const SEND_RETRY: Duration = Duration::from_millis(2);

/// Where resume blobs are written from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceMode {
    /// Write on the calling thread.
    Inline,
    /// Write on a dedicated worker thread behind a bounded queue.
    Background {
        /// Queue capacity; zero is treated as one.
        queue_depth: usize,
    },
}

impl Default for PersistenceMode {
    fn default() -> Self {
        Self::Background {
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

/// How a resume-store job is queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// Drop the job when the queue is full.
    BestEffort,
    /// Wait for queue room; only a closed writer drops the job.
    Guaranteed,
}

enum WriteJob {
    Save(InfoHash, Vec<u8>),
    Delete(InfoHash),
    Flush(std_mpsc::Sender<()>),
}

/// Worker thread applying queued saves and deletes to a store.
pub struct CheckpointWriter {
    sender: Mutex<Option<mpsc::Sender<WriteJob>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl CheckpointWriter {
    /// Start the worker thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn(store: Arc<dyn PersistenceStore>, queue_depth: usize) -> std::io::Result<Self> {
        let (sender, mut receiver) = mpsc::channel(queue_depth.max(1));
        let worker = thread::Builder::new()
            .name("ftorrent-checkpoint".into())
            .spawn(move || {
                while let Some(job) = receiver.blocking_recv() {
                    apply(store.as_ref(), job);
                }
                debug!("checkpoint writer drained");
            })?;
        Ok(Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Queue a save, dropping it when the queue is full. Returns `false` when dropped.
    pub fn submit_save(&self, info_hash: InfoHash, bytes: Vec<u8>) -> bool {
        self.submit(WriteJob::Save(info_hash, bytes), info_hash, Delivery::BestEffort)
    }

    /// Queue a save, waiting for room. Returns `false` only once the writer is closed.
    pub fn submit_save_waiting(&self, info_hash: InfoHash, bytes: Vec<u8>) -> bool {
        self.submit(WriteJob::Save(info_hash, bytes), info_hash, Delivery::Guaranteed)
    }

    /// Queue a delete, waiting for room. Returns `false` only once the writer is closed.
    pub fn submit_delete(&self, info_hash: InfoHash) -> bool {
        self.submit(WriteJob::Delete(info_hash), info_hash, Delivery::Guaranteed)
    }

    /// Block until every job queued so far has been applied.
    pub fn flush(&self) {
        let Some(sender) = lock(&self.sender).clone() else {
            return;
        };
        let (done, wait) = std_mpsc::channel();
        if send_waiting(&sender, WriteJob::Flush(done)).is_ok() {
            let _ = wait.recv();
        }
    }

    /// Close the queue and join the worker. Safe to call more than once.
    pub fn shutdown(&self) {
        drop(lock(&self.sender).take());
        if let Some(worker) = lock(&self.worker).take()
            && worker.join().is_err()
        {
            warn!("checkpoint writer thread panicked");
        }
    }

    fn submit(&self, job: WriteJob, info_hash: InfoHash, delivery: Delivery) -> bool {
        let Some(sender) = lock(&self.sender).clone() else {
            warn!(info_hash = %info_hash, "checkpoint writer closed; dropping job");
            return false;
        };
        let outcome = match delivery {
            Delivery::BestEffort => sender.try_send(job).map_err(|err| match err {
                TrySendError::Full(_) => "checkpoint queue full; dropping job",
                TrySendError::Closed(_) => "checkpoint writer stopped; dropping job",
            }),
            Delivery::Guaranteed => send_waiting(&sender, job)
                .map_err(|()| "checkpoint writer stopped; dropping job"),
        };
        match outcome {
            Ok(()) => true,
            Err(reason) => {
                warn!(info_hash = %info_hash, "{reason}");
                false
            }
        }
    }
}

impl Drop for CheckpointWriter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn send_waiting(sender: &mpsc::Sender<WriteJob>, mut job: WriteJob) -> Result<(), ()> {
    loop {
        match sender.try_send(job) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Full(returned)) => {
                job = returned;
                thread::sleep(SEND_RETRY);
            }
            Err(TrySendError::Closed(_)) => return Err(()),
        }
    }
}

fn apply(store: &dyn PersistenceStore, job: WriteJob) {
    match job {
        WriteJob::Save(info_hash, bytes) => {
            if let Err(err) = store.save(info_hash, &bytes) {
                warn!(error = %err, info_hash = %info_hash, "failed to persist resume data");
            }
        }
        WriteJob::Delete(info_hash) => {
            if let Err(err) = store.delete(info_hash) {
                warn!(error = %err, info_hash = %info_hash, "failed to delete resume data");
            }
        }
        WriteJob::Flush(done) => {
            let _ = done.send(());
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Destination for resume blobs chosen by [`PersistenceMode`].
pub(crate) enum ResumeSink {
    Inline(Arc<dyn PersistenceStore>),
    Background(CheckpointWriter),
}

impl ResumeSink {
    pub(crate) fn open(
        store: Arc<dyn PersistenceStore>,
        mode: PersistenceMode,
    ) -> std::io::Result<Self> {
        match mode {
            PersistenceMode::Inline => Ok(Self::Inline(store)),
            PersistenceMode::Background { queue_depth } => {
                CheckpointWriter::spawn(store, queue_depth).map(Self::Background)
            }
        }
    }

    /// Returns `false` when the job was dropped.
    pub(crate) fn save(&self, info_hash: InfoHash, bytes: Vec<u8>, delivery: Delivery) -> bool {
        match self {
            Self::Inline(store) => {
                apply(store.as_ref(), WriteJob::Save(info_hash, bytes));
                true
            }
            Self::Background(writer) => match delivery {
                Delivery::BestEffort => writer.submit_save(info_hash, bytes),
                Delivery::Guaranteed => writer.submit_save_waiting(info_hash, bytes),
            },
        }
    }

    pub(crate) fn delete(&self, info_hash: InfoHash) {
        match self {
            Self::Inline(store) => apply(store.as_ref(), WriteJob::Delete(info_hash)),
            Self::Background(writer) => {
                writer.submit_delete(info_hash);
            }
        }
    }

    pub(crate) fn flush(&self) {
        if let Self::Background(writer) = self {
            writer.flush();
        }
    }

    pub(crate) fn close(&self) {
        if let Self::Background(writer) = self {
            writer.shutdown();
        }
    }
}
