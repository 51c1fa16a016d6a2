//! CLI for the gridfetch batch raster exporter.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use commands::{
    load_config, run_batch, run_completions, run_manpage, run_plan, run_status, Overrides,
};

/// Top-level CLI for gridfetch.
#[derive(Debug, Parser)]
#[command(name = "gridfetch")]
#[command(about = "gridfetch: fetch per-cell raster products for a spatial grid", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/gridfetch/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch every product still missing for the grid.
    Run {
        /// CSV grid file with one polygon per row.
        #[arg(long, value_name = "PATH")]
        grid: PathBuf,
        /// Output root (overrides `output_root`).
        #[arg(long, short, value_name = "DIR")]
        output: Option<PathBuf>,
        /// Plan at most N tasks this run (overrides `request_cap`).
        #[arg(long, value_name = "N")]
        cap: Option<usize>,
        /// Run up to N tasks concurrently (overrides `concurrency`).
        #[arg(long, short, value_name = "N")]
        jobs: Option<usize>,
        /// Abort a stalled download after SECS seconds (overrides `request_timeout_secs`).
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
        /// Attempts per task, including the first (overrides `retry.max_attempts`).
        #[arg(long, value_name = "N")]
        max_attempts: Option<u32>,
        /// Write the keys of failed and never-started tasks to this file.
        #[arg(long, value_name = "PATH")]
        failed_out: Option<PathBuf>,
    },

    /// Print the tasks a run would dispatch, without fetching anything.
    Plan {
        #[arg(long, value_name = "PATH")]
        grid: PathBuf,
        #[arg(long, short, value_name = "DIR")]
        output: Option<PathBuf>,
        #[arg(long, value_name = "N")]
        cap: Option<usize>,
    },

    /// Show fetched vs. expected outputs per product.
    Status {
        #[arg(long, value_name = "PATH")]
        grid: PathBuf,
        #[arg(long, short, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Print shell completions to stdout.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print a roff man page to stdout.
    Manpage,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let config_path = cli.config;

        match cli.command {
            CliCommand::Run {
                grid,
                output,
                cap,
                jobs,
                timeout,
                max_attempts,
                failed_out,
            } => {
                let overrides = Overrides {
                    output,
                    cap,
                    jobs,
                    timeout,
                    max_attempts,
                };
                let cfg = load_config(config_path.as_deref(), &overrides)?;
                run_batch(cfg, &grid, failed_out.as_deref()).await?;
            }
            CliCommand::Plan { grid, output, cap } => {
                let overrides = Overrides {
                    output,
                    cap,
                    ..Overrides::default()
                };
                let cfg = load_config(config_path.as_deref(), &overrides)?;
                run_plan(&cfg, &grid)?;
            }
            CliCommand::Status { grid, output } => {
                let overrides = Overrides {
                    output,
                    ..Overrides::default()
                };
                let cfg = load_config(config_path.as_deref(), &overrides)?;
                run_status(&cfg, &grid)?;
            }
            CliCommand::Completions { shell } => run_completions(shell)?,
            CliCommand::Manpage => run_manpage()?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
