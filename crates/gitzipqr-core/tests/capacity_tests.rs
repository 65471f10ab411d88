//! Calibration behavior against real symbol rendering.

mod common;

use std::fs;
use std::path::PathBuf;

use gitzipqr_core::capacity::{self, MIN_CHUNK_SIZE};
use gitzipqr_core::config::available_cpus;
use gitzipqr_core::crypto::kdf::KdfParams;
use gitzipqr_core::pipeline::{cancel_flag, encode};
use gitzipqr_core::pool;
use gitzipqr_core::qr::decode::{scan_symbol, Scan};
use gitzipqr_core::Ecl;

use common::{fast_config, incompressible_bytes, passwords, symbol_count};

/// Quick variant of the scenario below; runs in the default test pass.
#[test]
fn high_ecc_encode_respects_the_chunk_floor() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("large.bin");
    fs::write(&input, incompressible_bytes(64 * 1024, 5)).unwrap();

    let mut cfg = fast_config();
    cfg.ecl = Ecl::H;
    cfg.workers = 4;

    let symbols = tmp.path().join("symbols");
    let cancel = cancel_flag();
    let summary = encode(&input, &symbols, &passwords(), &cfg, &cancel).unwrap();

    assert!(summary.chunk_size >= MIN_CHUNK_SIZE);
    assert_eq!(symbol_count(&symbols), summary.total_chunks as usize);

    // Every rendered symbol holds a parseable payload that already fit
    // one QR symbol by construction; spot-check first and last.
    for index in [0, summary.total_chunks - 1] {
        let path = symbols.join(format!("qr-{index:06}.png"));
        match scan_symbol(&path) {
            Scan::Payload(p) => {
                assert_eq!(p.chunk, index);
                assert_eq!(p.total, summary.total_chunks);
                assert_eq!(p.chunk_size, summary.chunk_size as u64);
            }
            Scan::Skipped { reason, .. } => panic!("{}: {reason}", path.display()),
        }
    }
}

/// 10 MiB source at `QR_ECL=H`: the calibrated chunk size stays at or
/// above the 512-byte floor and every one of the ~18k rendered images
/// parses back to a payload of this session, with the index range fully
/// covered. Rendering and re-scanning that many symbols dominates the
/// runtime, so the full-size run is opt-in: `cargo test -- --ignored`.
#[test]
#[ignore = "full 10 MiB render/scan pass; run with --ignored"]
fn ten_mib_file_at_high_ecc_fits_every_symbol() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("large.bin");
    fs::write(&input, incompressible_bytes(10 * 1024 * 1024, 3)).unwrap();

    let mut cfg = fast_config();
    cfg.ecl = Ecl::H;
    cfg.workers = available_cpus();

    let symbols = tmp.path().join("symbols");
    let cancel = cancel_flag();
    let summary = encode(&input, &symbols, &passwords(), &cfg, &cancel).unwrap();

    assert!(summary.chunk_size >= MIN_CHUNK_SIZE);
    assert_eq!(symbol_count(&symbols), summary.total_chunks as usize);

    let paths: Vec<PathBuf> = (0..summary.total_chunks)
        .map(|i| symbols.join(format!("qr-{i:06}.png")))
        .collect();
    let mut seen = vec![false; summary.total_chunks as usize];
    pool::run_jobs(
        cfg.workers,
        paths,
        &cancel,
        |path: PathBuf| match scan_symbol(&path) {
            Scan::Payload(p) => Ok(*p),
            Scan::Skipped { reason, .. } => Err(format!("{}: {reason}", path.display())),
        },
        |result| {
            let payload = result.expect("every rendered symbol parses back");
            assert_eq!(payload.total, summary.total_chunks);
            assert_eq!(payload.chunk_size, summary.chunk_size as u64);
            seen[payload.chunk as usize] = true;
        },
    );
    assert!(
        seen.iter().all(|&s| s),
        "every chunk index must appear exactly once across the symbol set"
    );
}

#[test]
fn explicit_chunk_size_override_wins() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("blob.bin");
    fs::write(&input, incompressible_bytes(3000, 11)).unwrap();

    let mut cfg = fast_config();
    cfg.ecl = Ecl::L;
    cfg.chunk_size = Some(777);

    let cancel = cancel_flag();
    let summary = encode(&input, &tmp.path().join("symbols"), &passwords(), &cfg, &cancel).unwrap();
    assert_eq!(summary.chunk_size, 777);
    assert_eq!(summary.total_chunks, 3016u32.div_ceil(777));
}

#[test]
fn calibration_shrinks_with_rising_ecc() {
    let params = KdfParams { n: 32768, r: 8, p: 8 };
    let q = capacity::calibrate("archive", ".zip", &params, Ecl::Q).unwrap();
    let h = capacity::calibrate("archive", ".zip", &params, Ecl::H).unwrap();
    assert!(h < q);
    assert!(h >= MIN_CHUNK_SIZE);
}
