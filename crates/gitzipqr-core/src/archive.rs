//! Deterministic directory → ZIP serialization.
//!
//! The same tree must produce the same container bytes on every run:
//! entries are added in sorted path order, every timestamp is pinned to
//! the fixed container epoch, permissions are normalized, and nothing
//! per-run (no comment, no extra fields) is written.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};

/// Serialize `dir` into a single ZIP container at `out`.
///
/// Symlinks are not followed. Directory entries are emitted so empty
/// directories survive the round trip.
pub fn archive_dir(dir: &Path, out: &Path) -> Result<()> {
    let mut files: Vec<PathBuf> = Vec::new();
    let mut dirs: Vec<PathBuf> = Vec::new();

    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.map_err(|e| Error::Input(format!("unreadable directory entry: {e}")))?;
        let path = entry.path();
        if path == dir {
            continue;
        }
        if entry.file_type().is_dir() {
            dirs.push(path.to_path_buf());
        } else if entry.file_type().is_file() {
            files.push(path.to_path_buf());
        }
    }

    // Stable traversal order across runs: sort by relative path bytes.
    dirs.sort();
    files.sort();

    let writer = File::create(out)?;
    let mut zip = ZipWriter::new(writer);

    let dir_options = entry_options().unix_permissions(0o755);
    for d in &dirs {
        zip.add_directory(rel_name(d, dir)?, dir_options)?;
    }

    let file_options = entry_options().unix_permissions(0o644);
    for f in &files {
        zip.start_file(rel_name(f, dir)?, file_options)?;
        let mut src = File::open(f)?;
        io::copy(&mut src, &mut zip)?;
    }

    let mut writer = zip.finish()?;
    writer.flush()?;
    debug!(files = files.len(), dirs = dirs.len(), out = %out.display(), "directory archived");
    Ok(())
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9))
        // ZIP timestamps cannot encode 1970; the fixed DOS epoch
        // (1980-01-01 00:00:00) keeps the container deterministic.
        .last_modified_time(zip::DateTime::default())
}

fn rel_name(path: &Path, root: &Path) -> Result<String> {
    let rel = path
        .strip_prefix(root)
        .map_err(|_| Error::Input(format!("path {} escapes archive root", path.display())))?;
    Ok(rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}
