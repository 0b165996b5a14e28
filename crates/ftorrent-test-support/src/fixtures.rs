//! Torrent and magnet fixtures.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_bencode::value::Value;
use sha1::{Digest, Sha1};

/// Piece length used by every fixture.
pub const FIXTURE_PIECE_LENGTH: u64 = 16_384;

/// Announce URL embedded in fixtures.
pub const FIXTURE_ANNOUNCE: &str = "udp://tracker.example.org:6969/announce";

/// Description of a single-file torrent.
#[derive(Debug, Clone)]
pub struct TorrentFixture {
    /// Torrent name, also the file name.
    pub name: String,
    /// Payload length in bytes.
    pub length: u64,
    /// Primary announce URL.
    pub announce: String,
}

impl TorrentFixture {
    /// Single-file fixture with the default announce URL.
    #[must_use]
    pub fn new(name: &str, length: u64) -> Self {
        Self {
            name: name.to_string(),
            length,
            announce: FIXTURE_ANNOUNCE.to_string(),
        }
    }

    /// Bencoded metainfo.
    ///
    /// # Errors
    ///
    /// Returns an error if the length does not fit bencode integers.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut root = HashMap::new();
        root.insert(
            b"announce".to_vec(),
            Value::Bytes(self.announce.as_bytes().to_vec()),
        );
        root.insert(b"info".to_vec(), self.info()?);
        Ok(serde_bencode::to_bytes(&Value::Dict(root))?)
    }

    /// Expected content identifier as lowercase hex.
    ///
    /// # Errors
    ///
    /// Returns an error if the info dictionary cannot be encoded.
    pub fn info_hash_hex(&self) -> Result<String> {
        let encoded = serde_bencode::to_bytes(&self.info()?)?;
        Ok(hex::encode(Sha1::digest(&encoded)))
    }

    /// Write `<name>.torrent` into `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(format!("{}.torrent", self.name));
        fs::write(&path, self.to_bytes()?)
            .with_context(|| format!("failed to write fixture {}", path.display()))?;
        Ok(path)
    }

    /// Magnet URI for the same content.
    ///
    /// # Errors
    ///
    /// Returns an error if the info hash cannot be computed.
    pub fn magnet(&self) -> Result<String> {
        Ok(magnet_uri(&self.info_hash_hex()?, Some(&self.name)))
    }

    fn info(&self) -> Result<Value> {
        let mut info = HashMap::new();
        info.insert(b"name".to_vec(), Value::Bytes(self.name.as_bytes().to_vec()));
        info.insert(b"length".to_vec(), Value::Int(i64::try_from(self.length)?));
        info.insert(
            b"piece length".to_vec(),
            Value::Int(i64::try_from(FIXTURE_PIECE_LENGTH)?),
        );
        info.insert(
            b"pieces".to_vec(),
            Value::Bytes(piece_hashes(&self.name, self.length)),
        );
        Ok(Value::Dict(info))
    }
}

/// Bencoded multi-file metainfo with the given `(path, length)` entries.
///
/// # Errors
///
/// Returns an error if a length does not fit bencode integers.
pub fn multi_file_torrent(name: &str, files: &[(&str, u64)]) -> Result<Vec<u8>> {
    let entries = files
        .iter()
        .map(|(path, length)| -> Result<Value> {
            let mut entry = HashMap::new();
            entry.insert(b"length".to_vec(), Value::Int(i64::try_from(*length)?));
            entry.insert(
                b"path".to_vec(),
                Value::List(
                    path.split('/')
                        .map(|segment| Value::Bytes(segment.as_bytes().to_vec()))
                        .collect(),
                ),
            );
            Ok(Value::Dict(entry))
        })
        .collect::<Result<Vec<_>>>()?;
    let total: u64 = files.iter().map(|(_, length)| length).sum();

    let mut info = HashMap::new();
    info.insert(b"name".to_vec(), Value::Bytes(name.as_bytes().to_vec()));
    info.insert(b"files".to_vec(), Value::List(entries));
    info.insert(
        b"piece length".to_vec(),
        Value::Int(i64::try_from(FIXTURE_PIECE_LENGTH)?),
    );
    info.insert(b"pieces".to_vec(), Value::Bytes(piece_hashes(name, total)));

    let mut root = HashMap::new();
    root.insert(b"info".to_vec(), Value::Dict(info));
    Ok(serde_bencode::to_bytes(&Value::Dict(root))?)
}

/// Magnet URI for a hex info hash with an optional display name.
#[must_use]
pub fn magnet_uri(info_hash_hex: &str, display_name: Option<&str>) -> String {
    let mut uri = format!("magnet:?xt=urn:btih:{info_hash_hex}");
    if let Some(name) = display_name {
        let encoded: String = url::form_urlencoded::byte_serialize(name.as_bytes()).collect();
        uri.push_str("&dn=");
        uri.push_str(&encoded);
    }
    uri
}

fn piece_hashes(seed: &str, length: u64) -> Vec<u8> {
    let pieces = length.div_ceil(FIXTURE_PIECE_LENGTH).max(1);
    (0..pieces)
        .flat_map(|index| {
            let mut hasher = Sha1::new();
            hasher.update(seed.as_bytes());
            hasher.update(index.to_be_bytes());
            hasher.finalize().to_vec()
        })
        .collect()
}
