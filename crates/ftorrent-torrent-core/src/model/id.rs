use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Length in bytes of a v1 content identifier.
const INFO_HASH_LEN: usize = 20;

/// 20-byte content identifier, rendered as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InfoHash([u8; INFO_HASH_LEN]);

impl InfoHash {
    /// Wrap raw digest bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; INFO_HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Borrow the raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; INFO_HASH_LEN] {
        &self.0
    }

    /// Build from a slice, rejecting anything that is not exactly 20 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ParseInfoHashError::Length`] when the slice has the wrong size.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ParseInfoHashError> {
        let array: [u8; INFO_HASH_LEN] = bytes
            .try_into()
            .map_err(|_| ParseInfoHashError::Length { found: bytes.len() })?;
        Ok(Self(array))
    }

    /// Lowercase hex rendering used for filenames and logs.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InfoHash({})", self.to_hex())
    }
}

/// Failure to parse a hex content identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseInfoHashError {
    /// Decoded byte count differs from 20.
    #[error("info hash must be 20 bytes")]
    Length {
        /// Number of bytes found.
        found: usize,
    },
    /// Input contained non-hex characters.
    #[error("info hash is not valid hex")]
    Hex,
}

impl FromStr for InfoHash {
    type Err = ParseInfoHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != INFO_HASH_LEN * 2 {
            return Err(ParseInfoHashError::Length { found: s.len() / 2 });
        }
        let bytes = hex::decode(s).map_err(|_| ParseInfoHashError::Hex)?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for InfoHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for InfoHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Opaque, non-owning reference into the engine.
///
/// Valid only while the engine reports the torrent as live; never reused
/// within one engine session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EngineHandle(u64);

impl EngineHandle {
    /// Wrap an engine-assigned slot number.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw slot number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_case_and_renders_lowercase() -> anyhow::Result<()> {
        let hash: InfoHash = "ABCDEF0123456789abcdef0123456789ABCDEF01".parse()?;
        assert_eq!(hash.to_string(), "abcdef0123456789abcdef0123456789abcdef01");
        Ok(())
    }

    #[test]
    fn rejects_wrong_length_and_bad_hex() {
        assert!(matches!(
            "abcd".parse::<InfoHash>(),
            Err(ParseInfoHashError::Length { .. })
        ));
        assert_eq!(
            "zz".repeat(20).parse::<InfoHash>(),
            Err(ParseInfoHashError::Hex)
        );
    }

    #[test]
    fn serializes_as_hex_string() -> anyhow::Result<()> {
        let hash = InfoHash::from_bytes([0xab; 20]);
        let json = serde_json::to_string(&hash)?;
        assert_eq!(json, format!("\"{}\"", "ab".repeat(20)));
        let back: InfoHash = serde_json::from_str(&json)?;
        assert_eq!(back, hash);
        Ok(())
    }
}
