//! AES-256-GCM frame encryption.
//!
//! Frame layout: `ciphertext body || 16-byte tag`. The tag is appended
//! rather than framed so the last 16 bytes of a reassembled buffer are
//! always the tag.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce, Tag};
use zeroize::Zeroizing;

use super::CryptoError;
use crate::crypto::kdf::KEY_SIZE;

pub const NONCE_SIZE: usize = 12;
pub const TAG_SIZE: usize = 16;

/// Encrypt `plaintext` in place and return the ciphertext frame.
///
/// The nonce must be freshly random for every encode session.
pub fn encrypt_frame(
    mut plaintext: Vec<u8>,
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(nonce), b"", &mut plaintext)
        .map_err(|e| CryptoError::Encrypt(e.to_string()))?;
    plaintext.extend_from_slice(&tag);
    Ok(plaintext)
}

/// Verify and decrypt a ciphertext frame.
///
/// The trailing 16 bytes are split off as the tag. A verification
/// failure never distinguishes wrong password from corruption.
pub fn decrypt_frame(
    mut frame: Vec<u8>,
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if frame.len() < TAG_SIZE {
        return Err(CryptoError::WrongPasswordOrCorrupted);
    }
    let tag_bytes = frame.split_off(frame.len() - TAG_SIZE);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(nonce),
            b"",
            &mut frame,
            Tag::from_slice(&tag_bytes),
        )
        .map_err(|_| CryptoError::WrongPasswordOrCorrupted)?;
    Ok(Zeroizing::new(frame))
}
