//! `gridfetch plan` – dry run: print the keys a run would fetch.

use anyhow::Result;
use gridfetch_core::config::GridfetchConfig;
use gridfetch_core::planner::Planner;
use std::path::Path;

use super::common::load_inputs;

pub fn run_plan(cfg: &GridfetchConfig, grid: &Path) -> Result<()> {
    let (load, resumption) = load_inputs(cfg, grid)?;
    let planner = Planner::new(cfg.product_requests(), &cfg.output_root);
    let tasks = planner.plan(&load.cells, &resumption, cfg.cap());
    for task in &tasks {
        println!("{}", task.key());
    }
    eprintln!(
        "{} task(s) planned; {} output(s) already present; {} grid row(s) skipped",
        tasks.len(),
        resumption.len(),
        load.skipped.len()
    );
    Ok(())
}
