//! Resolver interface: turn a product request into a single-use download URL.
//!
//! The executor only depends on this trait and does not know which imagery
//! service sits behind it.

mod http;

pub use http::{export_request_body, HttpResolver};

use std::collections::HashMap;

use crate::product::ProductSpec;

/// Direct download produced by a resolver. Valid for a bounded time and
/// meant to be fetched once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDownload {
    pub url: String,
    /// Extra headers required to perform the GET.
    pub headers: HashMap<String, String>,
}

impl ResolvedDownload {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Request never got an HTTP response (timeout, connection, ...).
    #[error("transport: {0}")]
    Transport(#[from] curl::Error),
    /// Service answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Rejected { status: u32, message: String },
    /// 2xx response that did not contain a usable URL.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// Service-specific failure reported by a resolver implementation.
    #[error("{0}")]
    Unavailable(String),
}

/// Implemented by imagery services able to materialize a product export.
pub trait Resolver: Send + Sync {
    fn resolve(&self, spec: &ProductSpec) -> Result<ResolvedDownload, ResolveError>;

    /// Startup check that the service is reachable at all. A failure here
    /// aborts the run before any task is dispatched.
    fn check_reachable(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
