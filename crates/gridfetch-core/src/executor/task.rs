//! One task: validate, then resolve → fetch → unpack → publish with retry.

use std::io::{BufWriter, Seek, SeekFrom};

use super::outcome::{FailureReason, TaskOutcome, TaskStatus};
use crate::control::ShutdownToken;
use crate::downloader::Downloader;
use crate::planner::FetchTask;
use crate::resolver::Resolver;
use crate::retry::{run_with_retry, FetchError, RetryPolicy, StopReason};
use crate::storage::{self, extract_archive, Published, StagingArea};

/// Runs a task to a terminal outcome. Never panics on task errors and never
/// leaves a partial directory at the task's final path.
pub(super) fn execute_task<R, D>(
    task: &FetchTask,
    resolver: &R,
    downloader: &D,
    policy: &RetryPolicy,
    shutdown: &ShutdownToken,
) -> TaskOutcome
where
    R: Resolver + ?Sized,
    D: Downloader + ?Sized,
{
    let key = task.key();
    let span = tracing::info_span!("task", key = %key);
    let _enter = span.enter();

    if let Err(e) = task.spec.validate() {
        tracing::error!("task failed without an attempt: invalid spec: {}", e);
        return TaskOutcome {
            key,
            attempts: 0,
            failures: Vec::new(),
            status: TaskStatus::Failed(FailureReason::InvalidSpec(e)),
        };
    }

    match run_with_retry(policy, shutdown, |_| attempt_once(task, &key, resolver, downloader)) {
        Ok(((files, published), attempts, failures)) => {
            tracing::debug!(attempts, files, ?published, "task succeeded");
            TaskOutcome {
                key,
                attempts,
                failures,
                status: TaskStatus::Succeeded { files, published },
            }
        }
        Err(failure) => {
            tracing::error!(
                attempts = failure.attempts,
                "task failed ({}): {}",
                failure.stop,
                failure.error
            );
            let reason = match failure.stop {
                StopReason::Exhausted => FailureReason::Exhausted(failure.error),
                StopReason::Cancelled => FailureReason::Cancelled(failure.error),
            };
            TaskOutcome {
                key,
                attempts: failure.attempts,
                failures: failure.failures,
                status: TaskStatus::Failed(reason),
            }
        }
    }
}

fn attempt_once<R, D>(
    task: &FetchTask,
    key: &str,
    resolver: &R,
    downloader: &D,
) -> Result<(usize, Published), FetchError>
where
    R: Resolver + ?Sized,
    D: Downloader + ?Sized,
{
    let root = task.output_root();
    let source = resolver.resolve(&task.spec)?;

    let mut spool = storage::spool_file(root, key).map_err(FetchError::Storage)?;
    let bytes = {
        let mut sink = BufWriter::new(spool.as_file_mut());
        downloader.fetch(&source, &mut sink)?
    };
    tracing::debug!(bytes, "archive downloaded");

    let mut archive = spool.as_file();
    archive.seek(SeekFrom::Start(0)).map_err(FetchError::Storage)?;
    let staging = StagingArea::create(root, key).map_err(FetchError::Storage)?;
    let files = extract_archive(archive, staging.path())?;
    let published = staging.publish(&task.output_dir).map_err(FetchError::Storage)?;
    if published == Published::AlreadyPresent {
        tracing::warn!("output already published by another writer, discarded this copy");
    }
    Ok((files, published))
}
