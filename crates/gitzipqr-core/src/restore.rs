//! Output restoration: naming and magic-number fallback.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

/// File name for restored output: `<name><ext>`. When the payload
/// carries no extension, the content's magic number decides, with
/// `.bin` as the fallback.
pub fn output_file_name(name: &str, ext: &str, content: &[u8]) -> String {
    if !ext.is_empty() {
        return format!("{name}{ext}");
    }
    match infer::get(content) {
        Some(kind) => format!("{name}.{}", kind.extension()),
        None => format!("{name}.bin"),
    }
}

/// Write restored plaintext into `dir`, creating it if needed.
pub fn write_output(dir: &Path, name: &str, ext: &str, content: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(output_file_name(name, ext, content));
    fs::write(&path, content)?;
    debug!(path = %path.display(), bytes = content.len(), "output written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_extension_wins() {
        assert_eq!(output_file_name("report", ".txt", b"anything"), "report.txt");
        assert_eq!(output_file_name("tree", ".zip", b"PK\x03\x04"), "tree.zip");
    }

    #[test]
    fn magic_number_detection_for_zip() {
        // Empty-archive ZIP signature.
        let zip_bytes = b"PK\x03\x04\x14\x00\x00\x00\x00\x00";
        assert_eq!(output_file_name("mystery", "", zip_bytes), "mystery.zip");
    }

    #[test]
    fn unknown_content_falls_back_to_bin() {
        assert_eq!(output_file_name("mystery", "", b"no recognizable magic"), "mystery.bin");
    }

    #[test]
    fn writes_into_fresh_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("restored/output");
        let path = write_output(&dir, "hello", ".txt", b"Hello World\n").unwrap();
        assert_eq!(path, dir.join("hello.txt"));
        assert_eq!(fs::read(&path).unwrap(), b"Hello World\n");
    }
}
