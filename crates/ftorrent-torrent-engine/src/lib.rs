#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(
    missing_docs,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]

//! Gateway around the external torrent engine.
//!
//! Layout: `gateway.rs` (session ownership and command translation),
//! `session/` (the engine trait plus the in-memory engine), `types.rs`
//! (runtime configuration), `metainfo.rs` and `magnet.rs` (source parsing),
//! `error.rs` (adapter-local failures).

pub mod error;
pub mod gateway;
pub mod magnet;
pub mod metainfo;
pub mod session;
pub mod types;

pub use error::{EngineError, op_failed};
pub use gateway::{EngineGateway, SessionFactory};
pub use magnet::MagnetLink;
pub use metainfo::{Metainfo, MetainfoFile};
pub use session::{AddSource, AddTorrentParams, EngineSession, MemoryEngine, TransferSample};
pub use types::{EngineRuntimeConfig, MemoryProfile, Toggle};
