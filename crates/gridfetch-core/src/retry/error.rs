//! Error of one task attempt.

use std::io;

use crate::resolver::ResolveError;
use crate::storage::UnpackError;

/// Failure of a single resolve → fetch → unpack attempt.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The imagery service could not produce a download URL.
    #[error("resolve: {0}")]
    Resolve(#[from] ResolveError),
    /// Curl reported an error (timeout, connection, etc.).
    #[error("download: {0}")]
    Curl(#[from] curl::Error),
    /// Download response had a non-2xx status.
    #[error("download: HTTP {0}")]
    Http(u32),
    /// Archive was corrupt or could not be extracted.
    #[error("unpack: {0}")]
    Unpack(#[from] UnpackError),
    /// Local spool/staging I/O failed.
    #[error("storage: {0}")]
    Storage(#[source] io::Error),
}
