//! PNG/JPEG symbol → recognized text → parsed payload.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::payload::ChunkPayload;

/// Outcome of scanning one image. Unreadable or foreign images are
/// skipped, never fatal: a directory of symbols may contain strays.
pub enum Scan {
    Payload(Box<ChunkPayload>),
    Skipped { path: PathBuf, reason: String },
}

impl Scan {
    fn skip(path: &Path, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!(path = %path.display(), %reason, "symbol skipped");
        Scan::Skipped {
            path: path.to_path_buf(),
            reason,
        }
    }
}

/// Load an image, find a QR symbol in it, and parse its payload.
pub fn scan_symbol(path: &Path) -> Scan {
    let image = match image::open(path) {
        Ok(img) => img.to_luma8(),
        Err(e) => return Scan::skip(path, format!("unreadable image: {e}")),
    };

    let mut prepared = rqrr::PreparedImage::prepare(image);
    let grids = prepared.detect_grids();
    if grids.is_empty() {
        return Scan::skip(path, "no QR symbol detected");
    }

    // A backup photo normally holds one symbol; take the first grid that
    // decodes and parses.
    let mut last_reason = String::from("no grid decoded");
    for grid in &grids {
        let content = match grid.decode() {
            Ok((_, content)) => content,
            Err(e) => {
                last_reason = format!("symbol decode failed: {e}");
                continue;
            }
        };
        match ChunkPayload::parse(&content) {
            Ok(payload) => return Scan::Payload(Box::new(payload)),
            Err(e) => last_reason = format!("payload rejected: {e}"),
        }
    }
    Scan::skip(path, last_reason)
}

/// True for the image extensions the decoder accepts.
pub fn is_symbol_image(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("png" | "jpg" | "jpeg")
    )
}
