//! Positional-read chunker over the ciphertext frame file.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::hash;

/// One slice of the ciphertext frame, ready for payload emission.
pub struct Chunk {
    pub index: u32,
    pub data: Vec<u8>,
    /// Hex SHA-256 of `data`.
    pub hash_hex: String,
}

/// Iterator over frame chunks. Each chunk is read with a positional
/// read, so the frame never has to be resident as a whole.
pub struct Chunker {
    file: File,
    len: u64,
    chunk_size: u64,
    total: u32,
    next: u32,
}

impl Chunker {
    pub fn open(path: &Path, chunk_size: usize) -> io::Result<Self> {
        assert!(chunk_size > 0, "chunk size must be positive");
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        let total = total_chunks(len, chunk_size as u64);
        Ok(Self {
            file,
            len,
            chunk_size: chunk_size as u64,
            total,
            next: 0,
        })
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn frame_len(&self) -> u64 {
        self.len
    }

    fn read_chunk(&mut self, index: u32) -> io::Result<Chunk> {
        let offset = u64::from(index) * self.chunk_size;
        let size = (self.len - offset).min(self.chunk_size) as usize;
        let mut data = vec![0u8; size];
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut data)?;
        let hash_hex = hash::digest_hex(&data);
        Ok(Chunk {
            index,
            data,
            hash_hex,
        })
    }
}

impl Iterator for Chunker {
    type Item = io::Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(self.read_chunk(index))
    }
}

pub fn total_chunks(len: u64, chunk_size: u64) -> u32 {
    len.div_ceil(chunk_size) as u32
}
