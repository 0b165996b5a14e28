//! Torrent metainfo (`.torrent`) parsing.
//!
//! # Design
//! - Decode into a generic bencode value first so the `info` dictionary can
//!   be re-encoded and hashed to derive the content identifier.
//! - Only the fields the engine needs are extracted; unknown keys are ignored.

use std::collections::HashMap;

use ftorrent_torrent_core::InfoHash;
use serde_bencode::value::Value;
use sha1::{Digest, Sha1};
use thiserror::Error;

/// Failures while decoding torrent metainfo.
#[derive(Debug, Error)]
pub enum MetainfoError {
    /// Input is not valid bencode.
    #[error("metainfo is not valid bencode")]
    Bencode(#[from] serde_bencode::Error),
    /// The top-level value is not a dictionary with an `info` entry.
    #[error("metainfo is missing the info dictionary")]
    MissingInfo,
    /// A required field is absent or has the wrong type.
    #[error("metainfo field is missing or malformed")]
    Field {
        /// Field name.
        field: &'static str,
    },
}

/// One file described by the metainfo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetainfoFile {
    /// Path relative to the torrent root, `/`-separated.
    pub path: String,
    /// Length in bytes.
    pub length: u64,
}

/// Parsed torrent metainfo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metainfo {
    /// SHA-1 of the bencoded `info` dictionary.
    pub info_hash: InfoHash,
    /// Suggested torrent name.
    pub name: String,
    /// Piece length in bytes.
    pub piece_length: u64,
    /// Number of pieces.
    pub piece_count: usize,
    /// Files in declaration order.
    pub files: Vec<MetainfoFile>,
    /// Announce URLs, `announce` first, then `announce-list`, deduplicated.
    pub trackers: Vec<String>,
    /// Original metainfo bytes.
    pub raw: Vec<u8>,
}

impl Metainfo {
    /// Parse metainfo bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MetainfoError`] when the input is not bencode, lacks an
    /// `info` dictionary, or has malformed required fields.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MetainfoError> {
        let Value::Dict(root) = serde_bencode::from_bytes::<Value>(bytes)? else {
            return Err(MetainfoError::MissingInfo);
        };
        let info_value = root
            .get(b"info".as_slice())
            .ok_or(MetainfoError::MissingInfo)?;
        let Value::Dict(info) = info_value else {
            return Err(MetainfoError::MissingInfo);
        };

        let encoded_info = serde_bencode::to_bytes(info_value)?;
        let digest = Sha1::digest(&encoded_info);
        let info_hash = InfoHash::from_slice(digest.as_slice())
            .map_err(|_| MetainfoError::Field { field: "info" })?;

        let name = text(info, "name").ok_or(MetainfoError::Field { field: "name" })?;
        let piece_length = integer(info, "piece length")
            .filter(|length| *length > 0)
            .ok_or(MetainfoError::Field {
                field: "piece length",
            })?;
        let pieces = bytes_of(info, "pieces")
            .filter(|pieces| !pieces.is_empty() && pieces.len() % 20 == 0)
            .ok_or(MetainfoError::Field { field: "pieces" })?;
        let files = parse_files(info, &name)?;

        Ok(Self {
            info_hash,
            name,
            piece_length,
            piece_count: pieces.len() / 20,
            files,
            trackers: parse_trackers(&root),
            raw: bytes.to_vec(),
        })
    }

    /// Sum of all file lengths.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|file| file.length).sum()
    }
}

type Dict = HashMap<Vec<u8>, Value>;

fn bytes_of<'a>(dict: &'a Dict, key: &str) -> Option<&'a [u8]> {
    match dict.get(key.as_bytes()) {
        Some(Value::Bytes(bytes)) => Some(bytes.as_slice()),
        _ => None,
    }
}

fn text(dict: &Dict, key: &str) -> Option<String> {
    bytes_of(dict, key).map(|bytes| String::from_utf8_lossy(bytes).into_owned())
}

fn integer(dict: &Dict, key: &str) -> Option<u64> {
    match dict.get(key.as_bytes()) {
        Some(Value::Int(value)) => u64::try_from(*value).ok(),
        _ => None,
    }
}

fn parse_files(info: &Dict, name: &str) -> Result<Vec<MetainfoFile>, MetainfoError> {
    if let Some(length) = integer(info, "length") {
        return Ok(vec![MetainfoFile {
            path: name.to_string(),
            length,
        }]);
    }

    let Some(Value::List(entries)) = info.get(b"files".as_slice()) else {
        return Err(MetainfoError::Field { field: "files" });
    };
    if entries.is_empty() {
        return Err(MetainfoError::Field { field: "files" });
    }

    entries
        .iter()
        .map(|entry| {
            let Value::Dict(entry) = entry else {
                return Err(MetainfoError::Field { field: "files" });
            };
            let length = integer(entry, "length").ok_or(MetainfoError::Field { field: "length" })?;
            let Some(Value::List(segments)) = entry.get(b"path".as_slice()) else {
                return Err(MetainfoError::Field { field: "path" });
            };
            let segments = segments
                .iter()
                .map(|segment| match segment {
                    Value::Bytes(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
                    _ => Err(MetainfoError::Field { field: "path" }),
                })
                .collect::<Result<Vec<_>, _>>()?;
            if segments.is_empty() {
                return Err(MetainfoError::Field { field: "path" });
            }
            Ok(MetainfoFile {
                path: format!("{name}/{}", segments.join("/")),
                length,
            })
        })
        .collect()
}

fn parse_trackers(root: &Dict) -> Vec<String> {
    let mut trackers: Vec<String> = Vec::new();
    let mut push = |url: String| {
        if !url.is_empty() && !trackers.contains(&url) {
            trackers.push(url);
        }
    };

    if let Some(url) = text(root, "announce") {
        push(url);
    }
    if let Some(Value::List(tiers)) = root.get(b"announce-list".as_slice()) {
        for tier in tiers {
            if let Value::List(urls) = tier {
                for url in urls {
                    if let Value::Bytes(bytes) = url {
                        push(String::from_utf8_lossy(bytes).into_owned());
                    }
                }
            }
        }
    }
    trackers
}
