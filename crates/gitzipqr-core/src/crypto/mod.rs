//! Cryptographic primitives: scrypt key derivation and AES-256-GCM
//! authenticated encryption of the ciphertext frame.

pub mod aead;
pub mod kdf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    /// Tag verification failed. Wrong password and corrupted data are
    /// cryptographically indistinguishable; they are reported uniformly.
    #[error("wrong password or corrupted data")]
    WrongPasswordOrCorrupted,

    #[error("invalid scrypt parameters: {0}")]
    InvalidParams(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("encryption failed: {0}")]
    Encrypt(String),
}
