use rand::Rng;
use std::time::Duration;

use crate::config::RetryConfig;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry; the attempt budget is spent.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff: `base * 2^(attempt-1)`, optionally capped and jittered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Upper bound on a single delay; `None` leaves the doubling uncapped.
    pub max_delay: Option<Duration>,
    /// Draw each delay uniformly from [delay/2, delay].
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: delay_from_secs(cfg.base_delay_secs),
            max_delay: cfg.max_delay_secs.map(delay_from_secs),
            jitter: cfg.jitter,
        }
    }
}

/// Saturating conversion: non-positive or NaN is zero, overflow is `Duration::MAX`.
fn delay_from_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

impl RetryPolicy {
    /// No delay between attempts; for tests and dry runs.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::ZERO,
            max_delay: None,
            jitter: false,
        }
    }

    /// Un-jittered delay after the failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        let raw = self.base_delay.saturating_mul(1u32 << exp);
        match self.max_delay {
            Some(cap) => raw.min(cap),
            None => raw,
        }
    }

    /// Decide what follows the failed attempt number `attempt` (1-based).
    pub fn decide(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }
        let delay = self.backoff(attempt);
        if !self.jitter || delay.is_zero() {
            return RetryDecision::RetryAfter(delay);
        }
        let full = delay.as_secs_f64();
        let jittered = rand::rng().random_range(full / 2.0..=full);
        // `full` may round above `delay` for very large delays.
        let jittered = Duration::try_from_secs_f64(jittered).map_or(delay, |d| d.min(delay));
        RetryDecision::RetryAfter(jittered)
    }
}
