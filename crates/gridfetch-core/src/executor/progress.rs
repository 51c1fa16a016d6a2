//! Batch progress reporting (tasks done, failures, ETA).
//!
//! Sent by the executor after each finished task; consumers can compute
//! rate = completed / elapsed_secs and ETA = (planned - completed) / rate.

/// Snapshot of batch progress (CLI-friendly).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressStats {
    /// Tasks handed to the executor.
    pub planned: usize,
    /// Tasks that reached a terminal outcome.
    pub completed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Elapsed time since the batch started (seconds).
    pub elapsed_secs: f64,
}

impl ProgressStats {
    /// Tasks finished per second (0 if elapsed is 0).
    pub fn tasks_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.completed as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (None if rate is 0).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.planned.saturating_sub(self.completed);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.tasks_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.planned == 0 {
            return 1.0;
        }
        (self.completed as f64 / self.planned as f64).min(1.0)
    }

    pub fn is_done(&self) -> bool {
        self.completed >= self.planned
    }
}
