//! Per-task outcomes and the aggregated run report.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::grid::SpecError;
use crate::retry::{ErrorKind, FetchError, StopReason};
use crate::storage::Published;

/// Why a task ended without output.
#[derive(Debug)]
pub enum FailureReason {
    /// Spec could not be sent to the resolver; never attempted.
    InvalidSpec(SpecError),
    /// Every attempt failed; carries the last error.
    Exhausted(FetchError),
    /// Shutdown was requested before the task could succeed.
    Cancelled(FetchError),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::InvalidSpec(e) => write!(f, "invalid spec: {}", e),
            FailureReason::Exhausted(e) => write!(f, "{} ({})", e, StopReason::Exhausted),
            FailureReason::Cancelled(e) => write!(f, "{} ({})", e, StopReason::Cancelled),
        }
    }
}

#[derive(Debug)]
pub enum TaskStatus {
    Succeeded { files: usize, published: Published },
    Failed(FailureReason),
}

/// Terminal result of one task.
#[derive(Debug)]
pub struct TaskOutcome {
    pub key: String,
    /// Attempts made, including the successful one. Zero for invalid specs.
    pub attempts: u32,
    /// Classification of every failed attempt, in order.
    pub failures: Vec<ErrorKind>,
    pub status: TaskStatus,
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, TaskStatus::Succeeded { .. })
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match &self.status {
            TaskStatus::Failed(reason) => Some(reason),
            TaskStatus::Succeeded { .. } => None,
        }
    }
}

/// Everything the executor learned about one batch.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Number of tasks handed to the executor.
    pub planned: usize,
    /// Outcomes in completion order.
    pub outcomes: Vec<TaskOutcome>,
    /// Keys never dispatched because shutdown was requested.
    pub not_started: Vec<String>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    /// Keys worth a targeted re-run: failed tasks plus never-started ones.
    pub fn failed_keys(&self) -> Vec<String> {
        self.failed()
            .map(|o| o.key.clone())
            .chain(self.not_started.iter().cloned())
            .collect()
    }

    pub fn outcome(&self, key: &str) -> Option<&TaskOutcome> {
        self.outcomes.iter().find(|o| o.key == key)
    }

    /// Failed-attempt counts across all tasks, by kind.
    pub fn retry_tally(&self) -> BTreeMap<ErrorKind, usize> {
        let mut tally = BTreeMap::new();
        for kind in self.outcomes.iter().flat_map(|o| o.failures.iter()) {
            *tally.entry(*kind).or_insert(0) += 1;
        }
        tally
    }

    pub fn is_complete(&self) -> bool {
        self.not_started.is_empty() && self.failed_count() == 0
    }
}
