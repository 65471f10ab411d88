//! Error types for the core pipeline.
//!
//! The variants map onto the failure classes the step runner reports:
//! bad input, integrity violations, cryptographic failures, symbol
//! capacity problems, and plain I/O.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Unusable input: missing file, empty symbol set, short password.
    #[error("{0}")]
    Input(String),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error(transparent)]
    Crypto(#[from] crate::crypto::CryptoError),

    #[error(transparent)]
    Payload(#[from] crate::payload::PayloadError),

    /// The payload overhead does not fit one symbol at the chosen ECL.
    #[error("capacity: {0}")]
    Capacity(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Cooperative cancellation (Ctrl-C) observed by the control thread.
    #[error("interrupted")]
    Interrupted,
}

/// Violations of the reassembly invariants.
///
/// Any of these is fatal for the decode: a decode that cannot verify all
/// invariants must not silently succeed. A single chunk whose bytes do
/// not match its declared hash is not listed here — the assembler drops
/// it with a warning and the gap surfaces as `MissingChunks`.
#[derive(Error, Debug)]
pub enum IntegrityError {
    #[error("ciphertext hash mismatch: expected {expected}, got {actual}")]
    CipherHashMismatch { expected: String, actual: String },

    #[error("missing chunk indices: {indices:?}")]
    MissingChunks { indices: Vec<u32> },

    #[error("conflicting session metadata across payloads: {field}")]
    MetadataConflict { field: &'static str },
}
