//! Durable storage for per-torrent resume blobs.
//!
//! # Design
//! - One file per torrent, named `<info-hash hex>.fastresume`, under a single root.
//! - Writes go to a sibling `.tmp` file first and are renamed into place, so a
//!   crash mid-write never leaves a truncated blob behind.
//! - Bulk loads skip entries that cannot be read; one bad blob never blocks the rest.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ftorrent_torrent_core::InfoHash;
use tracing::warn;

use crate::error::{StoreError, StoreResult};

const EXTENSION: &str = "fastresume";

/// Keyed persistence of opaque resume blobs.
pub trait PersistenceStore: Send + Sync {
    /// Persist a blob, replacing any previous one for the identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be written.
    fn save(&self, info_hash: InfoHash, bytes: &[u8]) -> StoreResult<()>;

    /// Load the blob for an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no blob exists, or an IO error.
    fn load(&self, info_hash: InfoHash) -> StoreResult<Vec<u8>>;

    /// Delete the blob for an identifier. Deleting a missing blob succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing blob cannot be removed.
    fn delete(&self, info_hash: InfoHash) -> StoreResult<()>;

    /// Every readable blob, ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store itself cannot be enumerated.
    fn load_all(&self) -> StoreResult<Vec<(InfoHash, Vec<u8>)>>;
}

/// Filesystem-backed [`PersistenceStore`].
#[derive(Debug, Clone)]
pub struct FastResumeStore {
    root: PathBuf,
}

impl FastResumeStore {
    /// Store rooted at `root`. The directory is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the blob for an identifier.
    #[must_use]
    pub fn path_for(&self, info_hash: InfoHash) -> PathBuf {
        self.root.join(format!("{}.{EXTENSION}", info_hash.to_hex()))
    }

    fn parse_entry(path: &Path) -> Option<InfoHash> {
        if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
            return None;
        }
        path.file_stem()?.to_str()?.parse().ok()
    }
}

impl PersistenceStore for FastResumeStore {
    fn save(&self, info_hash: InfoHash, bytes: &[u8]) -> StoreResult<()> {
        fs::create_dir_all(&self.root)
            .map_err(|source| StoreError::io("create_root", &self.root, source))?;
        let target = self.path_for(info_hash);
        let staging = target.with_extension(format!("{EXTENSION}.tmp"));
        fs::write(&staging, bytes).map_err(|source| StoreError::io("write", &staging, source))?;
        fs::rename(&staging, &target).map_err(|source| StoreError::io("rename", &target, source))
    }

    fn load(&self, info_hash: InfoHash) -> StoreResult<Vec<u8>> {
        let path = self.path_for(info_hash);
        fs::read(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                StoreError::NotFound { info_hash }
            } else {
                StoreError::io("read", &path, source)
            }
        })
    }

    fn delete(&self, info_hash: InfoHash) -> StoreResult<()> {
        let path = self.path_for(info_hash);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::io("delete", &path, source)),
        }
    }

    fn load_all(&self) -> StoreResult<Vec<(InfoHash, Vec<u8>)>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::io("read_dir", &self.root, source)),
        };

        let mut blobs = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(err) => {
                    warn!(error = %err, root = %self.root.display(), "skipping unreadable resume entry");
                    continue;
                }
            };
            let Some(info_hash) = Self::parse_entry(&path) else {
                continue;
            };
            match fs::read(&path) {
                Ok(bytes) => blobs.push((info_hash, bytes)),
                Err(err) => {
                    warn!(error = %err, path = %path.display(), "skipping unreadable resume blob");
                }
            }
        }
        blobs.sort_by_key(|(info_hash, _)| *info_hash);
        Ok(blobs)
    }
}
