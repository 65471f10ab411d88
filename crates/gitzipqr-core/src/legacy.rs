//! Acceptance of the legacy fragment layout (decode only).
//!
//! Older encoders wrote one `*.bin.json` fragment per chunk plus a
//! sidecar `manifest.json` carrying the session metadata. Both camelCase
//! and snake_case field spellings exist in the wild; both are accepted.
//! Nothing in this layout is ever produced anymore.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::payload::{self, ChunkPayload, PAYLOAD_TYPE, PAYLOAD_VERSION};

#[derive(Debug, Deserialize)]
struct LegacyManifest {
    #[serde(rename = "kdfParams", alias = "kdf_params")]
    kdf_params: crate::crypto::kdf::KdfParams,
    #[serde(rename = "saltB64", alias = "salt_b64")]
    salt_b64: String,
    #[serde(rename = "nonceB64", alias = "nonce_b64")]
    nonce_b64: String,
    #[serde(rename = "totalChunks", alias = "total_chunks")]
    total_chunks: u32,
    #[serde(rename = "cipherSha256", alias = "cipher_sha256")]
    cipher_sha256: String,
}

#[derive(Debug, Deserialize)]
struct LegacyFragment {
    data: String,
    chunk: u32,
    total: u32,
    name: String,
    hash: String,
    #[serde(rename = "cipherHash", alias = "cipher_hash")]
    cipher_hash: String,
    #[serde(default)]
    ext: Option<String>,
}

/// True when `dir` holds a legacy fragment set.
pub fn is_legacy_dir(dir: &Path) -> bool {
    dir.join("manifest.json").is_file()
}

/// True for a single legacy fragment file.
pub fn is_legacy_fragment(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".bin.json"))
}

/// Load a legacy session from a directory (or from the directory of a
/// single fragment file) and lift every fragment into a regular
/// [`ChunkPayload`].
pub fn load_legacy(input: &Path) -> Result<Vec<ChunkPayload>> {
    let dir = if input.is_dir() {
        input.to_path_buf()
    } else {
        input
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::Input(format!("fragment {} has no parent directory", input.display())))?
    };

    let manifest_path = dir.join("manifest.json");
    let manifest: LegacyManifest = serde_json::from_str(
        &fs::read_to_string(&manifest_path)
            .map_err(|e| Error::Input(format!("missing legacy manifest {}: {e}", manifest_path.display())))?,
    )?;

    let mut fragment_paths: Vec<PathBuf> = fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| is_legacy_fragment(p))
        .collect();
    fragment_paths.sort();

    if fragment_paths.is_empty() {
        return Err(Error::Input(format!(
            "no *.bin.json fragments found in {}",
            dir.display()
        )));
    }

    let mut payloads = Vec::with_capacity(fragment_paths.len());
    for path in &fragment_paths {
        let fragment: LegacyFragment = match fs::read_to_string(path)
            .map_err(Error::Io)
            .and_then(|text| serde_json::from_str(&text).map_err(Error::Json))
        {
            Ok(f) => f,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "legacy fragment skipped");
                continue;
            }
        };
        payloads.push(lift_fragment(fragment, &manifest));
    }

    debug!(
        fragments = payloads.len(),
        total = manifest.total_chunks,
        "legacy session loaded"
    );
    Ok(payloads)
}

fn lift_fragment(fragment: LegacyFragment, manifest: &LegacyManifest) -> ChunkPayload {
    ChunkPayload {
        kind: PAYLOAD_TYPE.to_string(),
        version: PAYLOAD_VERSION.to_string(),
        file_id: payload::file_id(&fragment.name, &fragment.cipher_hash),
        name: fragment.name,
        ext: fragment.ext.unwrap_or_default(),
        chunk: fragment.chunk,
        total: if fragment.total > 0 {
            fragment.total
        } else {
            manifest.total_chunks
        },
        hash: fragment.hash,
        cipher_hash: fragment.cipher_hash,
        data_b64: fragment.data,
        kdf_params: manifest.kdf_params,
        salt_b64: manifest.salt_b64.clone(),
        nonce_b64: manifest.nonce_b64.clone(),
        // The legacy layout never recorded the uniform chunk size.
        chunk_size: 0,
        part: None,
        part_total: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

    fn write_session(dir: &Path, snake_case: bool) {
        let chunk0 = b"legacy chunk zero";
        let chunk1 = b"legacy chunk one!";
        let whole: Vec<u8> = [chunk0.as_slice(), chunk1.as_slice()].concat();
        let cipher = crate::hash::digest_hex(&whole);

        let manifest = if snake_case {
            format!(
                r#"{{"kdf_params":{{"N":1024,"r":8,"p":1}},"salt_b64":"{}","nonce_b64":"{}","total_chunks":2,"cipher_sha256":"{cipher}"}}"#,
                BASE64.encode([1u8; 16]),
                BASE64.encode([2u8; 12]),
            )
        } else {
            format!(
                r#"{{"kdfParams":{{"N":1024,"r":8,"p":1}},"saltB64":"{}","nonceB64":"{}","totalChunks":2,"cipherSha256":"{cipher}"}}"#,
                BASE64.encode([1u8; 16]),
                BASE64.encode([2u8; 12]),
            )
        };
        fs::write(dir.join("manifest.json"), manifest).unwrap();

        for (i, chunk) in [chunk0.as_slice(), chunk1.as_slice()].iter().enumerate() {
            let hash = crate::hash::digest_hex(chunk);
            let key = if snake_case { "cipher_hash" } else { "cipherHash" };
            let fragment = format!(
                r#"{{"data":"{}","chunk":{i},"total":2,"name":"legacy","hash":"{hash}","{key}":"{cipher}"}}"#,
                BASE64.encode(chunk),
            );
            fs::write(dir.join(format!("chunk-{i:04}.bin.json")), fragment).unwrap();
        }
    }

    #[test]
    fn loads_camel_case_session() {
        let dir = tempfile::tempdir().unwrap();
        write_session(dir.path(), false);

        let payloads = load_legacy(dir.path()).unwrap();
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0].total, 2);
        assert_eq!(payloads[0].name, "legacy");
        assert_eq!(payloads[0].kdf_params.n, 1024);
        payloads[0].validate().unwrap();
    }

    #[test]
    fn loads_snake_case_session() {
        let dir = tempfile::tempdir().unwrap();
        write_session(dir.path(), true);

        let payloads = load_legacy(dir.path()).unwrap();
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[1].chunk, 1);
    }

    #[test]
    fn single_fragment_path_loads_whole_session() {
        let dir = tempfile::tempdir().unwrap();
        write_session(dir.path(), false);

        let payloads = load_legacy(&dir.path().join("chunk-0000.bin.json")).unwrap();
        assert_eq!(payloads.len(), 2);
    }

    #[test]
    fn legacy_payloads_reassemble() {
        let dir = tempfile::tempdir().unwrap();
        write_session(dir.path(), false);

        let payloads = load_legacy(dir.path()).unwrap();
        let mut asm = crate::assemble::Assembler::new();
        for p in &payloads {
            asm.accept(p).unwrap();
        }
        let (_, frame) = asm.finish().unwrap();
        assert_eq!(frame, b"legacy chunk zerolegacy chunk one!");
    }

    #[test]
    fn missing_manifest_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("chunk-0000.bin.json"), "{}").unwrap();
        assert!(matches!(load_legacy(dir.path()), Err(Error::Input(_))));
    }
}
