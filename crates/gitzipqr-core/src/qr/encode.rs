//! Payload JSON → QR symbol → PNG.

use std::path::{Path, PathBuf};

use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, QrCode};

use crate::config::Ecl;
use crate::error::{Error, Result};

/// Pixels per module in the rendered raster.
const MODULE_SCALE: u32 = 4;

/// One rendering job for the encoder pool.
pub struct RenderJob {
    pub index: u32,
    pub out_path: PathBuf,
    pub text: String,
}

/// Output file name for a chunk index: `qr-NNNNNN.png`, zero-padded so
/// filesystem enumeration order never matters.
pub fn symbol_file_name(index: u32) -> String {
    format!("qr-{index:06}.png")
}

/// Render `text` into a QR symbol PNG at `out_path`.
pub fn render_symbol(text: &str, ecl: Ecl, margin: u32, out_path: &Path) -> Result<()> {
    let image = render_image(text, ecl, margin)?;
    image
        .save_with_format(out_path, ImageFormat::Png)
        .map_err(Error::Image)
}

/// Rasterize `text` into a grayscale symbol image.
///
/// The quiet zone is drawn explicitly so the margin is an exact module
/// count rather than whatever a renderer defaults to.
pub fn render_image(text: &str, ecl: Ecl, margin: u32) -> Result<GrayImage> {
    let code = QrCode::with_error_correction_level(text.as_bytes(), ecl.to_qrcode())
        .map_err(|e| Error::Capacity(format!("payload does not fit one symbol at ECL {ecl}: {e}")))?;

    let width = code.width() as u32;
    let side = (width + 2 * margin) * MODULE_SCALE;
    let mut image = GrayImage::from_pixel(side, side, Luma([255u8]));

    let colors = code.to_colors();
    for (i, color) in colors.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let mx = (i as u32 % width + margin) * MODULE_SCALE;
        let my = (i as u32 / width + margin) * MODULE_SCALE;
        for dy in 0..MODULE_SCALE {
            for dx in 0..MODULE_SCALE {
                image.put_pixel(mx + dx, my + dy, Luma([0u8]));
            }
        }
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_zero_padded() {
        assert_eq!(symbol_file_name(0), "qr-000000.png");
        assert_eq!(symbol_file_name(42), "qr-000042.png");
        assert_eq!(symbol_file_name(123_456), "qr-123456.png");
    }

    #[test]
    fn renders_and_scans_back() {
        let text = r#"{"probe":"round trip through the rasterizer"}"#;
        let image = render_image(text, Ecl::Q, 1).unwrap();

        let mut prepared = rqrr::PreparedImage::prepare(image);
        let grids = prepared.detect_grids();
        assert_eq!(grids.len(), 1);
        let (_, content) = grids[0].decode().unwrap();
        assert_eq!(content, text);
    }

    #[test]
    fn margin_grows_the_canvas() {
        let tight = render_image("margin probe", Ecl::L, 0).unwrap();
        let roomy = render_image("margin probe", Ecl::L, 4).unwrap();
        assert_eq!(roomy.width(), tight.width() + 8 * MODULE_SCALE);
    }

    #[test]
    fn oversized_text_is_a_capacity_error() {
        let text = "x".repeat(4000);
        let err = render_symbol(&text, Ecl::H, 1, Path::new("/nonexistent/out.png")).unwrap_err();
        assert!(matches!(err, Error::Capacity(_)));
    }

    #[test]
    fn writes_a_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join(symbol_file_name(7));
        render_symbol("persisted symbol", Ecl::M, 2, &out).unwrap();

        let reloaded = image::open(&out).unwrap().to_luma8();
        let mut prepared = rqrr::PreparedImage::prepare(reloaded);
        let grids = prepared.detect_grids();
        let (_, content) = grids[0].decode().unwrap();
        assert_eq!(content, "persisted symbol");
    }
}
