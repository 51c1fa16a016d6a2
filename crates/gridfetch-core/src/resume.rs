//! Resumption state: which output keys are already on disk.
//!
//! The snapshot is taken once before planning and never refreshed. Two runs
//! against the same output root can therefore duplicate work; callers must
//! serialize runs on a root.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::io;
use std::path::Path;

use crate::product::{output_key, ProductType};
use crate::storage::is_staging_name;

/// Immutable set of output keys present when the snapshot was taken.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumptionState {
    keys: HashSet<String>,
}

impl ResumptionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Snapshot the directory names directly under `output_root`.
    /// Plain files and in-progress staging entries are ignored; a missing
    /// root is an empty snapshot.
    pub fn scan(output_root: &Path) -> Result<Self> {
        let entries = match std::fs::read_dir(output_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(root = %output_root.display(), "output root missing, nothing to resume");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("scan output root: {}", output_root.display()))
            }
        };

        let mut keys = HashSet::new();
        for entry in entries {
            let entry =
                entry.with_context(|| format!("scan output root: {}", output_root.display()))?;
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if is_staging_name(&name) {
                continue;
            }
            keys.insert(name);
        }
        tracing::debug!(root = %output_root.display(), keys = keys.len(), "resumption snapshot taken");
        Ok(Self { keys })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn is_already_fetched(&self, cell_id: u64, product: ProductType) -> bool {
        self.contains(&output_key(cell_id, product))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
