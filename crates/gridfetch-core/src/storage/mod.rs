//! Output directory lifecycle.
//!
//! Archives are spooled to a hidden temp file and extracted into a hidden
//! staging directory, both inside the output root so the final rename stays
//! on one filesystem. Only a fully extracted staging directory is renamed to
//! `output_root/{key}`; anything else is removed.

mod staging;
mod unpack;

pub use staging::{Published, StagingArea};
pub use unpack::{extract_archive, UnpackError};

use anyhow::{Context, Result};
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;

/// Prefix of every temporary entry the executor creates under the output root.
pub const STAGING_PREFIX: &str = ".gridfetch-";

/// True for names of in-progress spool files and staging directories.
pub fn is_staging_name(name: &str) -> bool {
    name.starts_with(STAGING_PREFIX)
}

/// Create the output root if needed.
pub fn prepare_output_root(output_root: &Path) -> Result<()> {
    std::fs::create_dir_all(output_root)
        .with_context(|| format!("create output root: {}", output_root.display()))
}

/// Hidden temp file for the downloaded archive; deleted when dropped.
pub fn spool_file(output_root: &Path, key: &str) -> io::Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(&format!("{}{}-", STAGING_PREFIX, key))
        .suffix(".zip")
        .tempfile_in(output_root)
}

/// Remove staging leftovers from a run that was killed before it could clean
/// up. Must not run while another instance is writing to the same root.
pub fn sweep_stale_staging(output_root: &Path) -> Result<usize> {
    let entries = match std::fs::read_dir(output_root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e).with_context(|| format!("read {}", output_root.display())),
    };
    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        if !is_staging_name(&name.to_string_lossy()) {
            continue;
        }
        let path = entry.path();
        let res = if entry.file_type()?.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        match res {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(path = %path.display(), "could not remove stale staging entry: {}", e),
        }
    }
    if removed > 0 {
        tracing::info!(removed, "removed stale staging entries");
    }
    Ok(removed)
}
