//! Request planning: which (cell, product) pairs still need fetching.
//!
//! Planning is pure: it reads the resumption snapshot and nothing else, so
//! the same inputs always yield the same task list in the same order
//! (cell-major, product-minor).

use std::path::{Path, PathBuf};

use crate::grid::Cell;
use crate::product::{output_key, ProductRequest, ProductSpec};
use crate::resume::ResumptionState;

/// One unit of work: a product spec and the directory it is published to.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTask {
    pub spec: ProductSpec,
    pub output_dir: PathBuf,
}

impl FetchTask {
    pub fn key(&self) -> String {
        self.spec.key()
    }

    /// Directory the task stages and publishes in.
    pub fn output_root(&self) -> &Path {
        self.output_dir.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Builds fetch tasks for a fixed product list under one output root.
#[derive(Debug, Clone)]
pub struct Planner {
    products: Vec<ProductRequest>,
    output_root: PathBuf,
}

impl Planner {
    pub fn new(products: Vec<ProductRequest>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            products,
            output_root: output_root.into(),
        }
    }

    /// Plan at most `cap` tasks, skipping every key already in `resumption`.
    /// Planning stops as soon as the cap is reached, possibly between two
    /// products of the same cell.
    pub fn plan(&self, cells: &[Cell], resumption: &ResumptionState, cap: usize) -> Vec<FetchTask> {
        let mut tasks = Vec::new();
        if cap == 0 {
            return tasks;
        }
        let mut resumed = 0usize;
        'cells: for cell in cells {
            for request in &self.products {
                let key = output_key(cell.id, request.product);
                if resumption.contains(&key) {
                    resumed += 1;
                    continue;
                }
                tasks.push(FetchTask {
                    spec: ProductSpec {
                        cell_id: cell.id,
                        product: request.product,
                        geometry: cell.geometry.clone(),
                        render: request.render.clone(),
                    },
                    output_dir: self.output_root.join(&key),
                });
                if tasks.len() >= cap {
                    tracing::info!(cap, "request cap reached, remaining cells left for a later run");
                    break 'cells;
                }
            }
        }
        tracing::debug!(planned = tasks.len(), resumed, "planning done");
        tasks
    }
}
