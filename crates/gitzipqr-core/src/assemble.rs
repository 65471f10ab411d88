//! Chunk reassembly: dedupe, order, verify, concatenate.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::{debug, warn};

use crate::crypto::aead::NONCE_SIZE;
use crate::crypto::kdf::{KdfParams, SALT_SIZE};
use crate::error::{Error, IntegrityError, Result};
use crate::hash;
use crate::payload::{ChunkPayload, PayloadError};

/// Session-level fields memoized from the first accepted payload. Every
/// later payload must agree on all of them.
#[derive(Debug, Clone)]
pub struct SessionMeta {
    pub file_id: String,
    pub name: String,
    pub ext: String,
    pub cipher_hash: String,
    pub kdf_params: KdfParams,
    pub salt: [u8; SALT_SIZE],
    pub nonce: [u8; NONCE_SIZE],
    pub total: u32,
    pub chunk_size: u64,
}

impl SessionMeta {
    fn from_payload(p: &ChunkPayload) -> Result<Self> {
        let salt = decode_fixed::<SALT_SIZE>(&p.salt_b64, "saltB64")?;
        let nonce = decode_fixed::<NONCE_SIZE>(&p.nonce_b64, "nonceB64")?;
        Ok(Self {
            file_id: p.file_id.clone(),
            name: p.name.clone(),
            ext: p.ext.clone(),
            cipher_hash: p.cipher_hash.clone(),
            kdf_params: p.kdf_params,
            salt,
            nonce,
            total: p.total,
            chunk_size: p.chunk_size,
        })
    }

    /// Name of the first field that disagrees with `p`, if any.
    fn conflict_with(&self, p: &ChunkPayload) -> Option<&'static str> {
        if self.file_id != p.file_id {
            Some("fileId")
        } else if self.name != p.name {
            Some("name")
        } else if self.ext != p.ext {
            Some("ext")
        } else if self.cipher_hash != p.cipher_hash {
            Some("cipherHash")
        } else if self.kdf_params != p.kdf_params {
            Some("kdfParams")
        } else if BASE64.encode(self.salt) != p.salt_b64 {
            Some("saltB64")
        } else if BASE64.encode(self.nonce) != p.nonce_b64 {
            Some("nonceB64")
        } else if self.total != p.total {
            Some("total")
        } else if self.chunk_size != p.chunk_size {
            Some("chunkSize")
        } else {
            None
        }
    }
}

fn decode_fixed<const N: usize>(b64: &str, field: &'static str) -> Result<[u8; N]> {
    let bytes = BASE64
        .decode(b64)
        .map_err(|source| Error::Payload(PayloadError::Base64 { field, source }))?;
    bytes.try_into().map_err(|v: Vec<u8>| {
        Error::Input(format!("{field}: expected {N} bytes, got {}", v.len()))
    })
}

/// What happened to one offered payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    Stored,
    /// Identical chunk already present.
    Duplicate,
    /// Dropped: declared hash does not match the carried bytes. A later
    /// duplicate with the correct hash may supersede.
    BadChunkHash,
}

/// Accumulates one session's chunks and reassembles the ciphertext frame.
#[derive(Default)]
pub struct Assembler {
    meta: Option<SessionMeta>,
    chunks: BTreeMap<u32, Vec<u8>>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn meta(&self) -> Option<&SessionMeta> {
        self.meta.as_ref()
    }

    pub fn present(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_complete(&self) -> bool {
        self.meta
            .as_ref()
            .is_some_and(|m| self.chunks.len() as u32 == m.total)
    }

    /// Offer one payload. Metadata conflicts are fatal; a chunk whose
    /// bytes do not match its declared hash is dropped with a warning.
    pub fn accept(&mut self, payload: &ChunkPayload) -> Result<Accept> {
        let meta = match &mut self.meta {
            Some(meta) => {
                if let Some(field) = meta.conflict_with(payload) {
                    return Err(IntegrityError::MetadataConflict { field }.into());
                }
                &*meta
            }
            empty @ None => empty.insert(SessionMeta::from_payload(payload)?),
        };

        let data = BASE64.decode(&payload.data_b64).map_err(|source| {
            Error::Payload(PayloadError::Base64 {
                field: "dataB64",
                source,
            })
        })?;

        if hash::digest_hex(&data) != payload.hash {
            warn!(
                file_id = %meta.file_id,
                chunk = payload.chunk,
                "chunk hash mismatch, payload dropped"
            );
            return Ok(Accept::BadChunkHash);
        }

        if self.chunks.contains_key(&payload.chunk) {
            return Ok(Accept::Duplicate);
        }
        debug!(file_id = %meta.file_id, chunk = payload.chunk, len = data.len(), "chunk stored");
        self.chunks.insert(payload.chunk, data);
        Ok(Accept::Stored)
    }

    /// Indices still absent.
    pub fn missing(&self) -> Vec<u32> {
        match &self.meta {
            None => Vec::new(),
            Some(meta) => (0..meta.total)
                .filter(|i| !self.chunks.contains_key(i))
                .collect(),
        }
    }

    /// Concatenate in index order and verify the whole-frame hash.
    pub fn finish(self) -> Result<(SessionMeta, Vec<u8>)> {
        let meta = self
            .meta
            .ok_or_else(|| Error::Input("no payloads accepted".to_string()))?;

        let missing: Vec<u32> = (0..meta.total)
            .filter(|i| !self.chunks.contains_key(i))
            .collect();
        if !missing.is_empty() {
            return Err(IntegrityError::MissingChunks { indices: missing }.into());
        }

        let mut frame = Vec::with_capacity(self.chunks.values().map(Vec::len).sum());
        for (_, data) in self.chunks {
            frame.extend_from_slice(&data);
        }

        let actual = hash::digest_hex(&frame);
        if actual != meta.cipher_hash {
            return Err(IntegrityError::CipherHashMismatch {
                expected: meta.cipher_hash.clone(),
                actual,
            }
            .into());
        }
        Ok((meta, frame))
    }
}
