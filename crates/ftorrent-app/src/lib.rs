#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(
    missing_docs,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]

//! ftorrent application bootstrap wiring.
//!
//! Layout: `bootstrap.rs` (process wiring and the update loop), `engine_config.rs`
//! (settings to engine/coordinator mapping), `error.rs` (`AppError`).

/// Application bootstrap and update loop.
pub mod bootstrap;
/// Settings to runtime mapping.
pub mod engine_config;
/// Application-level errors.
pub mod error;

pub use bootstrap::{BootstrapDependencies, RunSummary, run_app, run_app_with};
pub use engine_config::SessionPlan;
pub use error::{AppError, AppResult};
