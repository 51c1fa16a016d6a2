//! Zip extraction into a staging directory.

use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum UnpackError {
    #[error("corrupt archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("extract: {0}")]
    Io(#[from] io::Error),
    #[error("archive entry {0:?} escapes the output directory")]
    UnsafePath(String),
    #[error("archive contains no files")]
    Empty,
}

/// Extract every entry of a zip archive under `dest`, keeping relative paths.
/// Returns the number of files written. On error `dest` may hold a partial
/// extraction; the caller discards it.
pub fn extract_archive<R: Read + Seek>(reader: R, dest: &Path) -> Result<usize, UnpackError> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let mut files = 0usize;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| UnpackError::UnsafePath(entry.name().to_string()))?;
        let target = dest.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        files += 1;
    }
    if files == 0 {
        return Err(UnpackError::Empty);
    }
    Ok(files)
}
