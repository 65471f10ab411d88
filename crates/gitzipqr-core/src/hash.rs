//! Streaming SHA-256 digests.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

const READ_BUF_SIZE: usize = 64 * 1024;

/// Incremental SHA-256 over an arbitrary byte source.
pub struct StreamingHasher {
    inner: Sha256,
}

impl StreamingHasher {
    pub fn new() -> Self {
        Self { inner: Sha256::new() }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Consume the hasher, returning the lower-case hex digest.
    pub fn digest_hex(self) -> String {
        hex::encode(self.inner.finalize())
    }
}

impl Default for StreamingHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// SHA-256 of an in-memory buffer, lower-case hex.
pub fn digest_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// SHA-256 of a file's contents, lower-case hex.
///
/// Reads through a fixed-size buffer; the file is never loaded into
/// memory as a whole.
pub fn file_digest_hex(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = StreamingHasher::new();
    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.digest_hex())
}
