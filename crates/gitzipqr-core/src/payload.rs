//! The chunk payload record — the JSON document each QR symbol carries.
//!
//! Serialization is canonical: UTF-8, compact (no whitespace), keys in
//! declaration order, integers in base 10. The decoder accepts any field
//! order and ignores unknown fields so newer encoders stay readable.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::kdf::KdfParams;
use crate::hash;

/// Fixed `type` discriminator; payloads with any other value are dropped.
pub const PAYLOAD_TYPE: &str = "GitZipQR-CHUNK-ENC";

/// Format version. "inline-only" is the defining contract: every symbol
/// carries the full KDF parameters, salt, nonce and cipher hash, so no
/// sidecar manifest exists.
pub const PAYLOAD_VERSION: &str = "3.1-inline-only";

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("unrecognized payload type {0:?}")]
    WrongType(String),

    #[error("unsupported payload version {0:?}")]
    WrongVersion(String),

    #[error("chunk index {chunk} out of range (total {total})")]
    IndexOutOfRange { chunk: u32, total: u32 },

    #[error("multi-part symbols are not supported (partTotal = {0})")]
    MultiPart(u32),

    #[error("invalid payload JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid base64 in {field}: {source}")]
    Base64 {
        field: &'static str,
        source: base64::DecodeError,
    },
}

/// One QR symbol's worth of session state plus one ciphertext slice.
///
/// Field declaration order is the canonical emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
    /// 16 hex chars; demultiplexes mixed encode sessions in one directory.
    pub file_id: String,
    /// Original name stem, no extension.
    pub name: String,
    /// ".zip" for folders, the original extension for files, "" if unknown.
    pub ext: String,
    pub chunk: u32,
    #[serde(alias = "totalChunks", alias = "total_chunks")]
    pub total: u32,
    /// Hex SHA-256 of the raw chunk bytes (not of `dataB64`).
    pub hash: String,
    /// Hex SHA-256 of the entire ciphertext frame.
    pub cipher_hash: String,
    #[serde(alias = "data")]
    pub data_b64: String,
    pub kdf_params: KdfParams,
    pub salt_b64: String,
    pub nonce_b64: String,
    /// The uniform chunk size; the last chunk may be shorter.
    pub chunk_size: u64,
    /// Sub-part splitting fields some historic encoders referenced. Never
    /// emitted; rejected on decode when they declare a real split.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_total: Option<u32>,
}

impl ChunkPayload {
    /// Canonical JSON text for this payload.
    pub fn to_canonical_json(&self) -> Result<String, PayloadError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and validate a payload from decoded QR text.
    pub fn parse(text: &str) -> Result<Self, PayloadError> {
        let payload: ChunkPayload = serde_json::from_str(text)?;
        payload.validate()?;
        Ok(payload)
    }

    pub fn validate(&self) -> Result<(), PayloadError> {
        if self.kind != PAYLOAD_TYPE {
            return Err(PayloadError::WrongType(self.kind.clone()));
        }
        if self.version != PAYLOAD_VERSION {
            return Err(PayloadError::WrongVersion(self.version.clone()));
        }
        if self.total == 0 || self.chunk >= self.total {
            return Err(PayloadError::IndexOutOfRange {
                chunk: self.chunk,
                total: self.total,
            });
        }
        if let Some(part_total) = self.part_total {
            if part_total > 1 {
                return Err(PayloadError::MultiPart(part_total));
            }
        }
        Ok(())
    }
}

/// Session identifier: first 16 hex chars of `SHA-256(name ":" cipherHash)`.
pub fn file_id(name: &str, cipher_hash: &str) -> String {
    let mut h = hash::StreamingHasher::new();
    h.update(name.as_bytes());
    h.update(b":");
    h.update(cipher_hash.as_bytes());
    let mut digest = h.digest_hex();
    digest.truncate(16);
    digest
}

/// A payload with realistic worst-case field widths and empty `dataB64`,
/// used to measure the per-symbol JSON overhead during calibration.
pub fn overhead_template(name: &str, ext: &str, params: &KdfParams) -> ChunkPayload {
    ChunkPayload {
        kind: PAYLOAD_TYPE.to_string(),
        version: PAYLOAD_VERSION.to_string(),
        file_id: "f".repeat(16),
        name: name.to_string(),
        ext: ext.to_string(),
        chunk: u32::MAX,
        total: u32::MAX,
        hash: "0".repeat(64),
        cipher_hash: "0".repeat(64),
        data_b64: String::new(),
        kdf_params: *params,
        salt_b64: "A".repeat(24),
        nonce_b64: "A".repeat(16),
        chunk_size: u64::from(u32::MAX),
        part: None,
        part_total: None,
    }
}
