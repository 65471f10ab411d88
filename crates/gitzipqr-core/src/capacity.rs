//! Chunk-size calibration against the QR symbol capacity.
//!
//! The goal: the largest raw chunk size such that one payload JSON —
//! session metadata plus the base64 of one chunk — fits a single symbol
//! at the chosen error-correction level. Works from the known
//! version-40 byte capacities and the measured JSON overhead of an
//! empty-data payload, with empirical safety factors to absorb
//! per-chunk JSON variance and base64 padding.

use tracing::debug;

use crate::config::Ecl;
use crate::crypto::kdf::KdfParams;
use crate::error::{Error, Result};
use crate::payload;

/// Byte capacity of a version-40 symbol per error-correction level.
pub fn symbol_capacity(ecl: Ecl) -> usize {
    match ecl {
        Ecl::L => 2953,
        Ecl::M => 2331,
        Ecl::Q => 1663,
        Ecl::H => 1273,
    }
}

/// Absorbs per-chunk JSON variance (index digits, hash values).
const JSON_SAFETY: f64 = 0.92;

/// Slack on the base64 → raw conversion (padding, rounding).
const RAW_SAFETY: f64 = 0.98;

/// Calibrated chunk sizes never drop below this.
pub const MIN_CHUNK_SIZE: usize = 512;

/// Compute the raw chunk size for one symbol at `ecl`.
///
/// The overhead is measured on a payload carrying the actual name and
/// extension with worst-case numeric field widths, so long names shrink
/// the budget exactly as they do at render time.
pub fn calibrate(name: &str, ext: &str, params: &KdfParams, ecl: Ecl) -> Result<usize> {
    let template = payload::overhead_template(name, ext, params);
    let overhead = template.to_canonical_json()?.len();
    let capacity = symbol_capacity(ecl);

    if overhead >= capacity {
        return Err(Error::Capacity(format!(
            "payload overhead ({overhead} bytes) exceeds the {capacity}-byte symbol capacity at ECL {ecl}; lower the error-correction level"
        )));
    }

    let b64_budget = (capacity - overhead) as f64 * JSON_SAFETY;
    let raw = (b64_budget / 4.0 * 3.0 * RAW_SAFETY) as usize;
    let chunk_size = raw.max(MIN_CHUNK_SIZE);

    debug!(
        ecl = %ecl,
        capacity,
        overhead,
        chunk_size,
        "chunk size calibrated"
    );
    Ok(chunk_size)
}
