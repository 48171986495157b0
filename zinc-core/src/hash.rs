//! Streaming SHA-1 content hashing
//!
//! Pure function over bytes; no side effects. Hex-encoded, lowercase, 40
//! characters, matching the sha shape used throughout the catalog's object
//! and manifest paths.

use digest::Digest;
use sha1::Sha1;
use std::io::Read;

use crate::error::Result;

/// Length in hex characters of a SHA-1 digest.
pub const SHA1_HEX_LEN: usize = 40;

/// Incremental SHA-1 hasher over a byte stream.
#[derive(Default)]
pub struct StreamingHasher {
    inner: Sha1,
}

impl StreamingHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
    }

    /// Hex-encode the accumulated digest, lowercase, 40 characters.
    pub fn finish(self) -> String {
        hex::encode(self.inner.finalize())
    }
}

/// Hash a byte slice in one shot.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = StreamingHasher::new();
    hasher.update(bytes);
    hasher.finish()
}

/// Hash the contents of a readable stream, chunked to avoid loading the
/// whole file into memory.
pub fn hash_reader(mut reader: impl Read) -> Result<String> {
    let mut hasher = StreamingHasher::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finish())
}
