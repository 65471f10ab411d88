//! The step-driven encode and decode pipelines.
//!
//! Each pipeline prints one `STEP #N <label> ... [1|0]` line per phase;
//! the first `[0]` aborts the run. Temporary storage lives in a
//! [`tempfile::TempDir`] owned here, torn down on success and failure
//! alike.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use indicatif::{ProgressBar, ProgressStyle};
use rand::RngCore;
use tracing::{debug, info, warn};

use crate::archive;
use crate::assemble::{Assembler, SessionMeta};
use crate::capacity;
use crate::chunk::Chunker;
use crate::config::Config;
use crate::crypto::aead::{self, NONCE_SIZE};
use crate::crypto::kdf::{self, KdfParams, SALT_SIZE};
use crate::error::{Error, Result};
use crate::hash;
use crate::legacy;
use crate::payload::{self, ChunkPayload, PAYLOAD_TYPE, PAYLOAD_VERSION};
use crate::pool;
use crate::qr::decode::{is_symbol_image, scan_symbol, Scan};
use crate::qr::encode::{render_symbol, symbol_file_name, RenderJob};
use crate::restore;

pub use crate::pool::{cancel_flag, CancelFlag};

/// Outcome of a successful encode.
#[derive(Debug)]
pub struct EncodeSummary {
    pub file_id: String,
    pub total_chunks: u32,
    pub chunk_size: usize,
    pub frame_len: u64,
    pub output_dir: PathBuf,
}

struct PreparedInput {
    name: String,
    ext: String,
    data_path: PathBuf,
}

struct EncryptedSession {
    frame_path: PathBuf,
    cipher_hash: String,
    file_id: String,
    salt: [u8; SALT_SIZE],
    nonce: [u8; NONCE_SIZE],
}

/// Encode `input` (file or directory) into QR symbols under `output_dir`.
pub fn encode(
    input: &Path,
    output_dir: &Path,
    passwords: &[String],
    cfg: &Config,
    cancel: &CancelFlag,
) -> Result<EncodeSummary> {
    let tmp = tempfile::tempdir()?;

    run_step(1, "gather password", || validate_passwords(passwords))?;
    check_cancel(cancel)?;

    let prepared = run_step(2, "prepare data", || prepare_input(input, tmp.path()))?;
    check_cancel(cancel)?;

    let params = KdfParams::from_config(cfg);
    let session = run_step(3, "encrypt", || {
        encrypt_input(&prepared, passwords, &params, tmp.path())
    })?;
    check_cancel(cancel)?;

    let chunk_size = run_step(4, "calibrate capacity", || match cfg.chunk_size {
        Some(0) => Err(Error::Input("chunk size override must be positive".into())),
        Some(size) => Ok(size),
        None => capacity::calibrate(&prepared.name, &prepared.ext, &params, cfg.ecl),
    })?;
    check_cancel(cancel)?;

    let chunker = run_step(5, "chunk and enqueue", || {
        fs::create_dir_all(output_dir)?;
        let chunker = Chunker::open(&session.frame_path, chunk_size)?;
        if chunker.total() == 0 {
            return Err(Error::Input("empty ciphertext frame".into()));
        }
        Ok(chunker)
    })?;
    let total = chunker.total();
    let frame_len = chunker.frame_len();

    run_step(6, "render symbols", || {
        render_all(chunker, &prepared, &session, chunk_size, total, output_dir, cfg, cancel)
    })?;

    let summary = EncodeSummary {
        file_id: session.file_id.clone(),
        total_chunks: total,
        chunk_size,
        frame_len,
        output_dir: output_dir.to_path_buf(),
    };
    run_step(7, "summary", || {
        println!(
            "  {} symbol(s), chunk size {} bytes, fileId {} -> {}",
            summary.total_chunks,
            summary.chunk_size,
            summary.file_id,
            summary.output_dir.display()
        );
        Ok(())
    })?;
    info!(
        file_id = %summary.file_id,
        symbols = summary.total_chunks,
        chunk_size = summary.chunk_size,
        "encode complete"
    );
    Ok(summary)
}

/// Decode a directory of QR symbol images (or a legacy fragment set)
/// back into the original file(s). Returns the written output paths.
pub fn decode(
    input: &Path,
    output_dir: &Path,
    passwords: &[String],
    cfg: &Config,
    cancel: &CancelFlag,
) -> Result<Vec<PathBuf>> {
    validate_passwords(passwords)?;

    let payloads = run_step(1, "collect payloads", || collect_payloads(input, cfg, cancel))?;
    check_cancel(cancel)?;

    let sessions = run_step(2, "verify and assemble", || assemble_sessions(payloads))?;
    check_cancel(cancel)?;

    let restored = run_step(3, "decrypt", || {
        let secret = kdf::join_passwords(passwords);
        let mut restored = Vec::with_capacity(sessions.len());
        for (meta, frame) in sessions {
            let key = kdf::derive_key(&secret, &meta.salt, &meta.kdf_params)?;
            let plaintext = aead::decrypt_frame(frame, &key, &meta.nonce)?;
            debug!(file_id = %meta.file_id, bytes = plaintext.len(), "session decrypted");
            restored.push((meta, plaintext));
        }
        Ok(restored)
    })?;
    check_cancel(cancel)?;

    let paths = run_step(4, "write output", || {
        let mut paths = Vec::with_capacity(restored.len());
        for (meta, plaintext) in &restored {
            paths.push(restore::write_output(
                output_dir,
                &meta.name,
                &meta.ext,
                plaintext,
            )?);
        }
        Ok(paths)
    })?;

    info!(outputs = paths.len(), "decode complete");
    Ok(paths)
}

// ---------------------------------------------------------------------------
// encode internals
// ---------------------------------------------------------------------------

fn prepare_input(input: &Path, tmp: &Path) -> Result<PreparedInput> {
    let meta = fs::metadata(input)
        .map_err(|e| Error::Input(format!("cannot read input {}: {e}", input.display())))?;
    let base_name = input
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Input(format!("input {} has no usable name", input.display())))?;

    if meta.is_dir() {
        let data_path = tmp.join(format!("{base_name}.zip"));
        archive::archive_dir(input, &data_path)?;
        Ok(PreparedInput {
            name: base_name.to_string(),
            ext: ".zip".to_string(),
            data_path,
        })
    } else if meta.is_file() {
        let name = input
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or(base_name)
            .to_string();
        let ext = input
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        let data_path = tmp.join("source.dat");
        fs::copy(input, &data_path)?;
        Ok(PreparedInput {
            name,
            ext,
            data_path,
        })
    } else {
        Err(Error::Input(format!(
            "input {} is neither a file nor a directory",
            input.display()
        )))
    }
}

fn encrypt_input(
    prepared: &PreparedInput,
    passwords: &[String],
    params: &KdfParams,
    tmp: &Path,
) -> Result<EncryptedSession> {
    let mut salt = [0u8; SALT_SIZE];
    let mut nonce = [0u8; NONCE_SIZE];
    rand::rng().fill_bytes(&mut salt);
    rand::rng().fill_bytes(&mut nonce);

    let secret = kdf::join_passwords(passwords);
    let key = kdf::derive_key(&secret, &salt, params)?;

    // Consumed by in-place encryption, so plaintext and ciphertext are
    // never simultaneously resident.
    let plaintext = fs::read(&prepared.data_path)?;
    let frame = aead::encrypt_frame(plaintext, &key, &nonce)?;
    let frame_path = tmp.join("cipher.bin");
    fs::write(&frame_path, &frame)?;
    drop(frame);

    let cipher_hash = hash::file_digest_hex(&frame_path)?;
    let file_id = payload::file_id(&prepared.name, &cipher_hash);
    debug!(%file_id, %cipher_hash, "frame encrypted");
    Ok(EncryptedSession {
        frame_path,
        cipher_hash,
        file_id,
        salt,
        nonce,
    })
}

#[allow(clippy::too_many_arguments)]
fn render_all(
    chunker: Chunker,
    prepared: &PreparedInput,
    session: &EncryptedSession,
    chunk_size: usize,
    total: u32,
    output_dir: &Path,
    cfg: &Config,
    cancel: &CancelFlag,
) -> Result<()> {
    let salt_b64 = BASE64.encode(session.salt);
    let nonce_b64 = BASE64.encode(session.nonce);
    let params = KdfParams::from_config(cfg);

    // Lazily mapped so one worker holds one chunk; the frame itself
    // stays on disk behind positional reads.
    let name = prepared.name.clone();
    let ext = prepared.ext.clone();
    let file_id = session.file_id.clone();
    let cipher_hash = session.cipher_hash.clone();
    let out_dir = output_dir.to_path_buf();
    let jobs = chunker.map(move |chunk| -> Result<RenderJob> {
        let chunk = chunk?;
        let payload = ChunkPayload {
            kind: PAYLOAD_TYPE.to_string(),
            version: PAYLOAD_VERSION.to_string(),
            file_id: file_id.clone(),
            name: name.clone(),
            ext: ext.clone(),
            chunk: chunk.index,
            total,
            hash: chunk.hash_hex,
            cipher_hash: cipher_hash.clone(),
            data_b64: BASE64.encode(&chunk.data),
            kdf_params: params,
            salt_b64: salt_b64.clone(),
            nonce_b64: nonce_b64.clone(),
            chunk_size: chunk_size as u64,
            part: None,
            part_total: None,
        };
        Ok(RenderJob {
            index: chunk.index,
            out_path: out_dir.join(symbol_file_name(chunk.index)),
            text: payload.to_canonical_json()?,
        })
    });

    let bar = progress_bar(u64::from(total), "symbols rendered");
    let mut failures = 0usize;
    let mut first_error: Option<Error> = None;
    pool::run_jobs(
        cfg.workers,
        jobs,
        cancel,
        |job: Result<RenderJob>| -> Result<u32> {
            let job = job?;
            render_symbol(&job.text, cfg.ecl, cfg.margin, &job.out_path)?;
            Ok(job.index)
        },
        |result| match result {
            Ok(_) => bar.inc(1),
            Err(e) => {
                failures += 1;
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        },
    );
    bar.finish_and_clear();
    check_cancel(cancel)?;

    if let Some(e) = first_error {
        warn!(failures, "symbol rendering failed");
        return Err(e);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// decode internals
// ---------------------------------------------------------------------------

fn collect_payloads(input: &Path, cfg: &Config, cancel: &CancelFlag) -> Result<Vec<ChunkPayload>> {
    if legacy::is_legacy_fragment(input) {
        return legacy::load_legacy(input);
    }
    if !input.is_dir() {
        return Err(Error::Input(format!(
            "decode input must be a directory of symbols or a *.bin.json fragment: {}",
            input.display()
        )));
    }

    let mut payloads = if legacy::is_legacy_dir(input) {
        legacy::load_legacy(input)?
    } else {
        Vec::new()
    };

    let mut images: Vec<PathBuf> = fs::read_dir(input)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_symbol_image(p))
        .collect();
    images.sort();

    if images.is_empty() && payloads.is_empty() {
        return Err(Error::Input(format!(
            "no QR symbol images found in {}",
            input.display()
        )));
    }

    let bar = progress_bar(images.len() as u64, "symbols scanned");
    let mut skipped = 0usize;
    pool::run_jobs(
        cfg.workers,
        images,
        cancel,
        |path: PathBuf| scan_symbol(&path),
        |scan| {
            bar.inc(1);
            match scan {
                Scan::Payload(p) => payloads.push(*p),
                Scan::Skipped { .. } => skipped += 1,
            }
        },
    );
    bar.finish_and_clear();
    check_cancel(cancel)?;

    if skipped > 0 {
        warn!(skipped, usable = payloads.len(), "some images carried no usable payload");
    }
    if payloads.is_empty() {
        return Err(Error::Input("no usable chunk payloads recognized".into()));
    }
    Ok(payloads)
}

fn assemble_sessions(payloads: Vec<ChunkPayload>) -> Result<Vec<(SessionMeta, Vec<u8>)>> {
    let mut groups: HashMap<String, Assembler> = HashMap::new();
    for p in &payloads {
        groups.entry(p.file_id.clone()).or_default().accept(p)?;
    }

    // Deterministic session order regardless of scan completion order.
    let mut groups: Vec<(String, Assembler)> = groups.into_iter().collect();
    groups.sort_by(|a, b| a.0.cmp(&b.0));

    let mut sessions = Vec::with_capacity(groups.len());
    for (file_id, asm) in groups {
        let (meta, frame) = asm.finish()?;
        debug!(%file_id, chunks = meta.total, bytes = frame.len(), "session assembled");
        sessions.push((meta, frame));
    }
    Ok(sessions)
}

// ---------------------------------------------------------------------------
// shared plumbing
// ---------------------------------------------------------------------------

fn run_step<T>(n: u32, label: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    match f() {
        Ok(value) => {
            println!("STEP #{n} {label} ... [1]");
            Ok(value)
        }
        Err(e) => {
            println!("STEP #{n} {label} ... [0]");
            Err(e)
        }
    }
}

fn check_cancel(cancel: &CancelFlag) -> Result<()> {
    if pool::is_cancelled(cancel) {
        Err(Error::Interrupted)
    } else {
        Ok(())
    }
}

fn validate_passwords(passwords: &[String]) -> Result<()> {
    if passwords.is_empty() {
        return Err(Error::Input("no password supplied".into()));
    }
    for p in passwords {
        if p.len() < 8 {
            return Err(Error::Input("password must be at least 8 bytes".into()));
        }
    }
    Ok(())
}

fn progress_bar(total: u64, label: &str) -> ProgressBar {
    let bar = ProgressBar::new(total);
    let style = ProgressStyle::with_template("  {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar.set_message(label.to_string());
    bar
}
