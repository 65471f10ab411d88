// Each integration test binary compiles its own copy; not every helper
// is used by every binary.
#![allow(dead_code)]

use std::fs;
use std::path::Path;

use gitzipqr_core::{Config, Ecl};

pub const TEST_PASSWORD: &str = "correct horse battery";

/// Pipeline configuration with weak scrypt parameters. Test-only: key
/// derivation drops from seconds to milliseconds.
pub fn fast_config() -> Config {
    Config {
        scrypt_n: 1 << 12,
        scrypt_r: 8,
        scrypt_p: 1,
        ecl: Ecl::Q,
        margin: 1,
        workers: 2,
        chunk_size: None,
    }
}

pub fn passwords() -> Vec<String> {
    vec![TEST_PASSWORD.to_string()]
}

/// Deterministic pseudo-random bytes that deflate cannot meaningfully
/// compress, for exercising multi-chunk encodes.
pub fn incompressible_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15).max(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 24) as u8
        })
        .collect()
}

/// Count the `qr-*.png` symbols in a directory.
pub fn symbol_count(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.starts_with("qr-") && name.ends_with(".png")
        })
        .count()
}
