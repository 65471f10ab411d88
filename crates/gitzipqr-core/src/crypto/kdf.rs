//! Key derivation: scrypt(password, salt, N, r, p) → 256-bit key.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::CryptoError;
use crate::config::Config;

pub const KEY_SIZE: usize = 32;
pub const SALT_SIZE: usize = 16;

/// scrypt cost parameters, carried verbatim inside every chunk payload
/// so the decoder can re-derive the key without a sidecar manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    #[serde(rename = "N")]
    pub n: u32,
    pub r: u32,
    pub p: u32,
}

impl KdfParams {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            n: cfg.scrypt_n,
            r: cfg.scrypt_r,
            p: cfg.scrypt_p,
        }
    }

    /// N as log2, validating that it is a power of two ≥ 2.
    fn log2_n(&self) -> Result<u8, CryptoError> {
        if self.n < 2 || !self.n.is_power_of_two() {
            return Err(CryptoError::InvalidParams(format!(
                "N must be a power of two >= 2, got {}",
                self.n
            )));
        }
        Ok(self.n.trailing_zeros() as u8)
    }
}

/// Join multiple passwords with a single NUL byte separator.
///
/// This framing is a compatibility contract; any other separator would
/// derive a different key.
pub fn join_passwords(passwords: &[String]) -> Zeroizing<Vec<u8>> {
    let mut joined = Zeroizing::new(Vec::new());
    for (i, p) in passwords.iter().enumerate() {
        if i > 0 {
            joined.push(0u8);
        }
        joined.extend_from_slice(p.as_bytes());
    }
    joined
}

/// Derive a 32-byte key from the password bytes and salt.
///
/// Fatal on failure; there is no retry path.
pub fn derive_key(
    secret: &[u8],
    salt: &[u8; SALT_SIZE],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_SIZE]>, CryptoError> {
    let scrypt_params = scrypt::Params::new(params.log2_n()?, params.r, params.p, KEY_SIZE)
        .map_err(|e| {
            CryptoError::InvalidParams(format!(
                "N={}, r={}, p={}: {e}",
                params.n, params.r, params.p
            ))
        })?;

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    scrypt::scrypt(secret, salt, &scrypt_params, &mut key[..])
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(key)
}
