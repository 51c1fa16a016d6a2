//! Staging directory with atomic publish.

use std::io;
use std::path::Path;
use tempfile::TempDir;

use super::STAGING_PREFIX;

/// How a staging directory ended up at its final path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Published {
    /// Renamed into place by this task.
    Fresh,
    /// Another writer published the same key first; our copy was discarded.
    AlreadyPresent,
}

/// Hidden directory under the output root that receives extracted files.
/// Removed on drop unless it was published.
#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    pub fn create(output_root: &Path, key: &str) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}{}-", STAGING_PREFIX, key))
            .tempdir_in(output_root)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Rename the staging directory to `final_path`. The final path either
    /// does not exist or holds a complete output; it never holds a partial one.
    /// An existing directory counts as published; any other entry is an error.
    pub fn publish(self, final_path: &Path) -> io::Result<Published> {
        if final_path.is_dir() {
            return Ok(Published::AlreadyPresent);
        }
        if std::fs::symlink_metadata(final_path).is_ok() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} exists and is not a directory", final_path.display()),
            ));
        }
        match std::fs::rename(self.dir.path(), final_path) {
            // The TempDir drop that follows finds nothing left to remove.
            Ok(()) => Ok(Published::Fresh),
            Err(_) if final_path.is_dir() => Ok(Published::AlreadyPresent),
            Err(e) => Err(e),
        }
    }
}
