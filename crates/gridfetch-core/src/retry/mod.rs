//! Retry and backoff policy.
//!
//! Every failure of a single resolve → fetch → unpack attempt is a
//! `FetchError`. The policy decides whether another attempt follows and how
//! long to wait; classification feeds logging and the run summary.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status, ErrorKind};
pub use error::FetchError;
pub use policy::{RetryDecision, RetryPolicy};
pub use run::{run_with_retry, RetryFailure, StopReason};
