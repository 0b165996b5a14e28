//! Core torrent domain types shared across the workspace.

mod details;
mod event;
mod id;
mod record;
mod status;

pub use details::{FileInfo, PeerInfo, TorrentDetails, TrackerInfo, TrackerStatus};
pub use event::{EngineEvent, ResumeParams};
pub use id::{EngineHandle, InfoHash, ParseInfoHashError};
pub use record::{RATIO_INFINITE, TorrentRecord, TorrentState};
pub use status::{EngineActivity, EngineStatus};
