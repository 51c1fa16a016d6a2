//! `gridfetch status` – fetched vs. expected outputs per product.

use anyhow::Result;
use gridfetch_core::config::GridfetchConfig;
use gridfetch_core::grid::Cell;
use gridfetch_core::product::ProductType;
use gridfetch_core::resume::ResumptionState;
use std::path::Path;

use super::common::load_inputs;

pub fn run_status(cfg: &GridfetchConfig, grid: &Path) -> Result<()> {
    let (load, resumption) = load_inputs(cfg, grid)?;
    println!("{:<28} {:>10} {:>10} {:>8}", "PRODUCT", "FETCHED", "EXPECTED", "DONE");
    for request in cfg.product_requests() {
        let fetched = fetched_count(&load.cells, &resumption, request.product);
        let expected = load.cells.len();
        let pct = if expected == 0 {
            100.0
        } else {
            fetched as f64 * 100.0 / expected as f64
        };
        println!(
            "{:<28} {:>10} {:>10} {:>7.1}%",
            request.product.as_str(), fetched, expected, pct
        );
    }
    if !load.skipped.is_empty() {
        println!("{} grid row(s) skipped", load.skipped.len());
    }
    Ok(())
}

fn fetched_count(cells: &[Cell], resumption: &ResumptionState, product: ProductType) -> usize {
    cells
        .iter()
        .filter(|c| resumption.is_already_fetched(c.id, product))
        .count()
}
