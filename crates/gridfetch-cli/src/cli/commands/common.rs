//! Config loading and grid/resumption setup shared by `run`, `plan` and `status`.

use anyhow::{Context, Result};
use gridfetch_core::config::{self, GridfetchConfig};
use gridfetch_core::grid::{load_grid, GridLoad};
use gridfetch_core::resume::ResumptionState;
use std::path::{Path, PathBuf};

/// Command-line settings that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub output: Option<PathBuf>,
    pub cap: Option<usize>,
    pub jobs: Option<usize>,
    pub timeout: Option<u64>,
    pub max_attempts: Option<u32>,
}

impl Overrides {
    fn apply(&self, cfg: &mut GridfetchConfig) {
        if let Some(output) = &self.output {
            cfg.output_root = output.clone();
        }
        if let Some(cap) = self.cap {
            cfg.request_cap = Some(cap);
        }
        if let Some(jobs) = self.jobs {
            cfg.concurrency = jobs;
        }
        if let Some(timeout) = self.timeout {
            cfg.request_timeout_secs = timeout;
        }
        if let Some(max_attempts) = self.max_attempts {
            cfg.retry.max_attempts = max_attempts;
        }
    }
}

/// Load the config (explicit path or the XDG default), apply overrides and
/// validate the result.
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<GridfetchConfig> {
    let mut cfg = match path {
        Some(path) => config::load_from_path(path)?,
        None => config::load_or_init()?,
    };
    overrides.apply(&mut cfg);
    cfg.validate().context("invalid settings")?;
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

/// Read the grid and snapshot the output root. Both are fatal on error.
pub fn load_inputs(cfg: &GridfetchConfig, grid: &Path) -> Result<(GridLoad, ResumptionState)> {
    let load = load_grid(grid, &cfg.geometry_column)?;
    if !load.skipped.is_empty() {
        tracing::warn!(skipped = load.skipped.len(), "grid rows skipped");
    }
    let resumption = ResumptionState::scan(&cfg.output_root)?;
    tracing::info!(
        cells = load.cells.len(),
        already_fetched = resumption.len(),
        "inputs loaded"
    );
    Ok((load, resumption))
}
