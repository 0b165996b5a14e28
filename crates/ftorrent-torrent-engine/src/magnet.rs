//! Magnet URI parsing.

use ftorrent_torrent_core::InfoHash;
use thiserror::Error;
use url::Url;

const HEX_ENCODED_LEN: usize = 40;
const BASE32_ENCODED_LEN: usize = 32;

/// Failures while parsing a magnet URI.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MagnetError {
    /// Input is not a URI.
    #[error("magnet uri is not a valid uri")]
    Url,
    /// Scheme is not `magnet`.
    #[error("uri scheme is not magnet")]
    Scheme,
    /// No `xt=urn:btih:` parameter was present.
    #[error("magnet uri has no btih exact topic")]
    MissingTopic,
    /// The info hash is neither 40 hex nor 32 base32 characters.
    #[error("magnet uri info hash is malformed")]
    InfoHash,
}

/// Parsed magnet link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagnetLink {
    /// Content identifier from the `xt` parameter.
    pub info_hash: InfoHash,
    /// Display name from `dn`, when present.
    pub display_name: Option<String>,
    /// Tracker URLs from `tr`, deduplicated in order.
    pub trackers: Vec<String>,
}

impl MagnetLink {
    /// Parse a `magnet:?xt=urn:btih:...` URI.
    ///
    /// # Errors
    ///
    /// Returns [`MagnetError`] when the URI is malformed or lacks a v1 info hash.
    pub fn parse(uri: &str) -> Result<Self, MagnetError> {
        let url = Url::parse(uri.trim()).map_err(|_| MagnetError::Url)?;
        if url.scheme() != "magnet" {
            return Err(MagnetError::Scheme);
        }

        let mut info_hash = None;
        let mut display_name = None;
        let mut trackers: Vec<String> = Vec::new();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "xt" => {
                    if let Some(encoded) = value.strip_prefix("urn:btih:") {
                        info_hash = Some(decode_info_hash(encoded)?);
                    }
                }
                "dn" if !value.is_empty() => display_name = Some(value.into_owned()),
                "tr" => {
                    let tracker = value.into_owned();
                    if !tracker.is_empty() && !trackers.contains(&tracker) {
                        trackers.push(tracker);
                    }
                }
                _ => {}
            }
        }

        Ok(Self {
            info_hash: info_hash.ok_or(MagnetError::MissingTopic)?,
            display_name,
            trackers,
        })
    }
}

fn decode_info_hash(encoded: &str) -> Result<InfoHash, MagnetError> {
    match encoded.len() {
        HEX_ENCODED_LEN => encoded.parse().map_err(|_| MagnetError::InfoHash),
        BASE32_ENCODED_LEN => {
            let bytes = base32::decode(
                base32::Alphabet::Rfc4648 { padding: false },
                &encoded.to_ascii_uppercase(),
            )
            .ok_or(MagnetError::InfoHash)?;
            InfoHash::from_slice(&bytes).map_err(|_| MagnetError::InfoHash)
        }
        _ => Err(MagnetError::InfoHash),
    }
}
