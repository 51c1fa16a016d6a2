//! `gridfetch run` – plan and fetch every missing product for a grid.

use anyhow::{Context, Result};
use gridfetch_core::config::GridfetchConfig;
use gridfetch_core::control::ShutdownToken;
use gridfetch_core::downloader::CurlDownloader;
use gridfetch_core::executor::{Executor, ProgressStats, RunReport};
use gridfetch_core::planner::Planner;
use gridfetch_core::resolver::{HttpResolver, Resolver};
use gridfetch_core::storage;
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use super::common::load_inputs;

const PROGRESS_INTERVAL_MS: u64 = 500;

pub async fn run_batch(cfg: GridfetchConfig, grid: &Path, failed_out: Option<&Path>) -> Result<()> {
    let root = cfg.output_root.clone();
    storage::prepare_output_root(&root)?;
    storage::sweep_stale_staging(&root)?;

    let (load, resumption) = load_inputs(&cfg, grid)?;
    let planner = Planner::new(cfg.product_requests(), &root);
    let tasks = planner.plan(&load.cells, &resumption, cfg.cap());
    if tasks.is_empty() {
        println!(
            "Nothing to fetch: {} cell(s), {} output(s) already present.",
            load.cells.len(),
            resumption.len()
        );
        return Ok(());
    }

    let connect_timeout = Duration::from_secs(cfg.connect_timeout_secs);
    let resolver = HttpResolver::from_config(&cfg.resolver, connect_timeout)?;
    resolver.check_reachable()?;

    let shutdown = ShutdownToken::new();
    let handler_token = shutdown.clone();
    ctrlc::set_handler(move || {
        if !handler_token.is_requested() {
            eprintln!("\ninterrupt: finishing in-flight tasks, no new tasks will start");
        }
        handler_token.request();
    })
    .context("install Ctrl-C handler")?;

    let executor = Executor::new(resolver, CurlDownloader::new(cfg.curl_options()))
        .with_retry_policy(cfg.retry_policy())
        .with_concurrency(cfg.concurrency)
        .with_shutdown(shutdown);

    println!(
        "Fetching {} task(s) for {} cell(s) into {} ({} worker(s))",
        tasks.len(),
        load.cells.len(),
        root.display(),
        cfg.concurrency
    );

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<ProgressStats>(64);
    let progress_handle = tokio::spawn(async move {
        let mut last_print = Instant::now();
        while let Some(stats) = progress_rx.recv().await {
            let now = Instant::now();
            if now.duration_since(last_print).as_millis() as u64 >= PROGRESS_INTERVAL_MS
                || stats.is_done()
            {
                let eta = stats
                    .eta_secs()
                    .map(|s| format!("{:.0}s", s))
                    .unwrap_or_else(|| "?".to_string());
                print!(
                    "\r  {} / {} tasks ({:.1}%)  failed {}  {:.2} tasks/s  ETA {}  ",
                    stats.completed,
                    stats.planned,
                    stats.fraction() * 100.0,
                    stats.failed,
                    stats.tasks_per_sec(),
                    eta
                );
                let _ = io::stdout().flush();
                last_print = now;
            }
        }
    });

    let report = tokio::task::spawn_blocking(move || executor.run(tasks, Some(&progress_tx)))
        .await
        .context("executor thread panicked")?;
    let _ = progress_handle.await;

    print_summary(&report, load.skipped.len());
    if let Some(path) = failed_out {
        write_failed_keys(&report, path)?;
    }
    Ok(())
}

fn print_summary(report: &RunReport, skipped_rows: usize) {
    println!();
    println!(
        "Done in {:.1}s: {} succeeded, {} failed, {} not started ({} planned)",
        report.elapsed.as_secs_f64(),
        report.succeeded(),
        report.failed_count(),
        report.not_started.len(),
        report.planned
    );
    if skipped_rows > 0 {
        println!("{} grid row(s) skipped (see log)", skipped_rows);
    }
    let tally = report.retry_tally();
    if !tally.is_empty() {
        let parts: Vec<String> = tally.iter().map(|(k, n)| format!("{} {}", k, n)).collect();
        println!("Failed attempts by kind: {}", parts.join(", "));
    }
    for outcome in report.failed() {
        if let Some(reason) = outcome.failure() {
            println!("  FAILED {} after {} attempt(s): {}", outcome.key, outcome.attempts, reason);
        }
    }
    for key in &report.not_started {
        println!("  NOT STARTED {}", key);
    }
}

/// One key per line; empty file when everything succeeded.
fn write_failed_keys(report: &RunReport, path: &Path) -> Result<()> {
    let mut body = report.failed_keys().join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    std::fs::write(path, body).with_context(|| format!("write failed keys: {}", path.display()))?;
    tracing::info!(path = %path.display(), "failed keys written");
    Ok(())
}
