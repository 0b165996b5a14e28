#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(
    missing_docs,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]

//! Session coordination: the tracked-record map, event interpretation,
//! persistence checkpoints, and caller notifications.
//!
//! Layout: `coordinator.rs` (the orchestrator), `store.rs` (resume blobs on
//! disk), `writer.rs` (background checkpoint writer), `notify.rs` (callback
//! slots), `stats.rs` (aggregate counters), `tracker.rs` (add-time tracker
//! augmentation), `error.rs` (store failures).

pub mod coordinator;
pub mod error;
pub mod notify;
pub mod stats;
pub mod store;
pub mod tracker;
pub mod writer;

pub use coordinator::{CoordinatorOptions, SessionCoordinator};
pub use error::{StoreError, StoreResult};
pub use notify::ErrorReport;
pub use stats::SessionStats;
pub use store::{FastResumeStore, PersistenceStore};
pub use tracker::{StaticTrackers, TrackerAugmentation};
pub use writer::{CheckpointWriter, PersistenceMode};
