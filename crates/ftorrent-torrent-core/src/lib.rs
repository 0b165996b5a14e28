#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(
    missing_docs,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]

//! Engine-agnostic torrent domain model shared across the workspace.
//!
//! Layout: `model/` (identifiers, engine status, records, events, details),
//! `error.rs` (command taxonomy), `format.rs` (display helpers).

pub mod error;
pub mod format;
pub mod model;

pub use error::{TorrentError, TorrentResult};
pub use model::{
    EngineActivity, EngineEvent, EngineHandle, EngineStatus, FileInfo, InfoHash, PeerInfo,
    RATIO_INFINITE, ResumeParams, TorrentDetails, TorrentRecord, TorrentState, TrackerInfo,
    TrackerStatus,
};
