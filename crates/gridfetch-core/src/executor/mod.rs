//! Fetch executor.
//!
//! Drains a planned task list with a fixed worker budget. Each task runs
//! resolve → fetch → unpack → publish inside its own retry loop; a task that
//! fails terminally is recorded in the report and the batch carries on.

mod outcome;
mod pool;
mod progress;
mod task;

pub use outcome::{FailureReason, RunReport, TaskOutcome, TaskStatus};
pub use progress::ProgressStats;

use std::time::Instant;

use crate::control::ShutdownToken;
use crate::downloader::Downloader;
use crate::planner::FetchTask;
use crate::resolver::Resolver;
use crate::retry::RetryPolicy;

/// Default number of concurrent tasks.
pub const DEFAULT_CONCURRENCY: usize = 25;

#[derive(Debug)]
pub struct Executor<R, D> {
    resolver: R,
    downloader: D,
    policy: RetryPolicy,
    concurrency: usize,
    shutdown: ShutdownToken,
}

impl<R, D> Executor<R, D>
where
    R: Resolver,
    D: Downloader,
{
    pub fn new(resolver: R, downloader: D) -> Self {
        Self {
            resolver,
            downloader,
            policy: RetryPolicy::default(),
            concurrency: DEFAULT_CONCURRENCY,
            shutdown: ShutdownToken::new(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Share a shutdown token (e.g. one flipped by a Ctrl-C handler).
    pub fn with_shutdown(mut self, shutdown: ShutdownToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn shutdown_token(&self) -> ShutdownToken {
        self.shutdown.clone()
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn downloader(&self) -> &D {
        &self.downloader
    }

    /// Run every task to a terminal outcome. Per-task failures are recorded,
    /// never returned as errors. If `progress_tx` is `Some`, a progress
    /// snapshot is sent after each finished task (dropped if the consumer
    /// lags).
    pub fn run(
        &self,
        tasks: Vec<FetchTask>,
        progress_tx: Option<&tokio::sync::mpsc::Sender<ProgressStats>>,
    ) -> RunReport {
        let started = Instant::now();
        let planned = tasks.len();
        tracing::info!(planned, workers = self.concurrency, "batch started");

        let mut report = RunReport {
            planned,
            ..RunReport::default()
        };
        let mut succeeded = 0usize;
        let mut failed = 0usize;

        let left = pool::run_pool(
            tasks,
            self.concurrency,
            &self.shutdown,
            |task| {
                task::execute_task(
                    &task,
                    &self.resolver,
                    &self.downloader,
                    &self.policy,
                    &self.shutdown,
                )
            },
            |outcome| {
                if outcome.is_success() {
                    succeeded += 1;
                } else {
                    failed += 1;
                }
                report.outcomes.push(outcome);
                if let Some(tx) = progress_tx {
                    let _ = tx.try_send(ProgressStats {
                        planned,
                        completed: report.outcomes.len(),
                        succeeded,
                        failed,
                        elapsed_secs: started.elapsed().as_secs_f64(),
                    });
                }
            },
        );

        report.not_started = left.iter().map(FetchTask::key).collect();
        report.elapsed = started.elapsed();
        if !report.not_started.is_empty() {
            tracing::warn!(not_started = report.not_started.len(), "batch interrupted");
        }
        tracing::info!(
            planned,
            succeeded,
            failed,
            elapsed_secs = report.elapsed.as_secs_f64(),
            "batch finished"
        );
        report
    }
}

#[cfg(test)]
pub(crate) mod testing;
