//! Retry loop: run an attempt until success or the policy says stop.

use std::fmt;

use super::classify::{classify, ErrorKind};
use super::error::FetchError;
use super::policy::{RetryDecision, RetryPolicy};
use crate::control::ShutdownToken;

/// Why the retry loop gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `max_attempts` attempts all failed.
    Exhausted,
    /// Shutdown was requested while waiting to retry.
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Exhausted => f.write_str("retries exhausted"),
            StopReason::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Last error of a task that never succeeded.
#[derive(Debug)]
pub struct RetryFailure {
    pub error: FetchError,
    pub attempts: u32,
    pub stop: StopReason,
    /// Classification of every failed attempt, in order.
    pub failures: Vec<ErrorKind>,
}

/// Runs `f` until it succeeds or the retry policy says to stop. `f` receives
/// the 1-based attempt number. On failure, sleeps for the backoff duration
/// (waking early on shutdown) then tries again.
///
/// On success returns the value, the number of attempts made and the kinds
/// of the failed attempts before it.
pub fn run_with_retry<T, F>(
    policy: &RetryPolicy,
    shutdown: &ShutdownToken,
    mut f: F,
) -> Result<(T, u32, Vec<ErrorKind>), RetryFailure>
where
    F: FnMut(u32) -> Result<T, FetchError>,
{
    let mut attempt = 1u32;
    let mut failures = Vec::new();
    loop {
        match f(attempt) {
            Ok(value) => return Ok((value, attempt, failures)),
            Err(error) => {
                let kind = classify(&error);
                failures.push(kind);
                let stop = match policy.decide(attempt) {
                    RetryDecision::NoRetry => StopReason::Exhausted,
                    RetryDecision::RetryAfter(delay) => {
                        tracing::warn!(
                            attempt,
                            kind = %kind,
                            delay_ms = delay.as_millis() as u64,
                            "attempt failed, retrying: {}",
                            error
                        );
                        if shutdown.sleep(delay) {
                            attempt += 1;
                            continue;
                        }
                        StopReason::Cancelled
                    }
                };
                return Err(RetryFailure {
                    error,
                    attempts: attempt,
                    stop,
                    failures,
                });
            }
        }
    }
}
