#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(
    missing_docs,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]

//! Read-only settings for the ftorrent client, loaded from TOML with
//! environment overrides.
//!
//! Layout: `model.rs` (typed settings sections), `defaults.rs` (default values
//! and platform directories), `loader.rs` (`SettingsLoader`), `validate.rs`
//! (field checks), `error.rs` (`ConfigError`).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ENV_CONFIG_PATH, SettingsLoader};
pub use model::{
    DiscoverySettings, LogFormatSetting, LoggingSettings, MemoryMode, NetworkSettings,
    PersistenceKind, SessionSettings, Settings, StorageSettings, Toggle,
};
