//! Settings discovery, parsing and environment overrides.
//!
//! # Design
//! - Source order: explicit path, then `FTORRENT_CONFIG`, then the platform
//!   configuration directory. Only an explicitly named file must exist.
//! - Overrides are applied after parsing and before validation, so an override
//!   can repair a bad file value but can never bypass validation.
//! - The environment is read through an injectable lookup.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};
use crate::model::Settings;

/// Environment variable naming the settings file.
pub const ENV_CONFIG_PATH: &str = "FTORRENT_CONFIG";
/// Overrides `network.listen_port`.
pub const ENV_LISTEN_PORT: &str = "FTORRENT_LISTEN_PORT";
/// Overrides `storage.save_path`.
pub const ENV_SAVE_PATH: &str = "FTORRENT_SAVE_PATH";
/// Overrides `storage.resume_dir`.
pub const ENV_RESUME_DIR: &str = "FTORRENT_RESUME_DIR";
/// Overrides `logging.level`.
pub const ENV_LOG_LEVEL: &str = "FTORRENT_LOG_LEVEL";

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Builds a validated [`Settings`] from file and environment.
pub struct SettingsLoader {
    explicit: Option<PathBuf>,
    lookup: EnvLookup,
}

impl fmt::Debug for SettingsLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsLoader")
            .field("explicit", &self.explicit)
            .finish_non_exhaustive()
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsLoader {
    /// Loader reading the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self {
            explicit: None,
            lookup: Box::new(|key| std::env::var(key).ok()),
        }
    }

    /// Read settings from `path`, which must exist.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    /// Replace the environment lookup.
    #[must_use]
    pub fn with_env(
        mut self,
        lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.lookup = Box::new(lookup);
        self
    }

    fn env(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.trim().is_empty())
    }

    /// The settings file that [`Self::load`] would read, and whether it must exist.
    #[must_use]
    pub fn resolve_path(&self) -> Option<(PathBuf, bool)> {
        if let Some(path) = &self.explicit {
            return Some((path.clone(), true));
        }
        if let Some(path) = self.env(ENV_CONFIG_PATH) {
            return Some((PathBuf::from(path), true));
        }
        defaults::settings_path().map(|path| (path, false))
    }

    /// Load, override and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if a required file is missing or unreadable, the file is
    /// not valid settings TOML, an override is malformed, or validation fails.
    pub fn load(&self) -> ConfigResult<Settings> {
        let mut settings = match self.resolve_path() {
            Some((path, required)) => read_settings(&path, required)?,
            None => Settings::default(),
        };
        self.apply_overrides(&mut settings)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply the `FTORRENT_*` overrides to `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when `FTORRENT_LISTEN_PORT` is not a port.
    pub fn apply_overrides(&self, settings: &mut Settings) -> ConfigResult<()> {
        if let Some(port) = self.env(ENV_LISTEN_PORT) {
            settings.network.listen_port = port.trim().parse().map_err(|_| {
                ConfigError::invalid(
                    "network",
                    "listen_port",
                    Some(port.clone()),
                    "must be between 1 and 65535",
                )
            })?;
        }
        if let Some(path) = self.env(ENV_SAVE_PATH) {
            settings.storage.save_path = PathBuf::from(path);
        }
        if let Some(path) = self.env(ENV_RESUME_DIR) {
            settings.storage.resume_dir = PathBuf::from(path);
        }
        if let Some(level) = self.env(ENV_LOG_LEVEL) {
            settings.logging.level = level;
        }
        Ok(())
    }
}

fn read_settings(path: &Path, required: bool) -> ConfigResult<Settings> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(source) if source.kind() == io::ErrorKind::NotFound && !required => {
            debug!(path = %path.display(), "no settings file; using defaults");
            return Ok(Settings::default());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                operation: "read_settings",
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let settings = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source: Box::new(source),
    })?;
    info!(path = %path.display(), "settings loaded");
    Ok(settings)
}
