//! File variant encoding: `raw` (identity) and `gz` (deterministic gzip).

use flate2::Compression;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::error::{Error, Result};

/// Recognized object encodings. `raw` is always present for a file; `gz`
/// is written only when it beats the configured compression ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Format {
    Raw,
    Gz,
}

impl Format {
    /// File extension used in the object path, `None` for `raw`.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            Format::Raw => None,
            Format::Gz => Some("gz"),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::Raw => "raw",
            Format::Gz => "gz",
        }
    }

    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "raw" => Ok(Format::Raw),
            "gz" => Ok(Format::Gz),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

impl Serialize for Format {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Format {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Format::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Per-(file, format) size record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatEntry {
    pub size: u64,
}

/// Compression policy: how much smaller (as a fraction of the raw size)
/// the gzip-encoded bytes must be before the `gz` variant is kept.
/// A ratio of `0.0` (the default) accepts any strict reduction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionPolicy {
    pub min_reduction_ratio: f64,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self { min_reduction_ratio: 0.0 }
    }
}

impl CompressionPolicy {
    /// Whether `gz_size` is small enough, relative to `raw_size`, to be worth keeping.
    pub fn accepts(&self, raw_size: u64, gz_size: u64) -> bool {
        if gz_size >= raw_size {
            return false;
        }
        let reduction = 1.0 - (gz_size as f64 / raw_size.max(1) as f64);
        reduction > self.min_reduction_ratio
    }
}

/// Deterministic gzip encode: fixed mtime (0) and OS byte so repeated runs
/// of the same input produce byte-identical output, and therefore the same
/// sha when the encoded bytes are themselves hashed.
pub fn encode_gz(raw: &[u8]) -> Result<Vec<u8>> {
    let header = flate2::GzBuilder::new().mtime(0);
    let mut encoder = header.write(Vec::new(), Compression::default());
    encoder.write_all(raw)?;
    Ok(encoder.finish()?)
}

/// Decode a gzip-encoded buffer back to raw bytes.
pub fn decode_gz(encoded: &[u8]) -> Result<Vec<u8>> {
    use std::io::Read;
    let mut decoder = flate2::read::GzDecoder::new(encoded);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gz_roundtrip() {
        let raw = b"hello hello hello hello hello hello hello hello".to_vec();
        let encoded = encode_gz(&raw).unwrap();
        assert_eq!(decode_gz(&encoded).unwrap(), raw);
    }

    #[test]
    fn gz_encoding_is_deterministic() {
        let raw = b"the quick brown fox jumps over the lazy dog".repeat(50);
        let a = encode_gz(&raw).unwrap();
        let b = encode_gz(&raw).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn compression_policy_default_accepts_any_reduction() {
        let policy = CompressionPolicy::default();
        assert!(policy.accepts(100, 99));
        assert!(!policy.accepts(100, 100));
        assert!(!policy.accepts(100, 101));
    }

    #[test]
    fn format_name_round_trips() {
        assert_eq!(Format::parse("raw").unwrap(), Format::Raw);
        assert_eq!(Format::parse("gz").unwrap(), Format::Gz);
        assert!(Format::parse("zip").is_err());
    }
}
