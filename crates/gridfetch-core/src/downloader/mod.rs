//! Archive download: one HTTP GET streamed into a local sink.

mod single;

pub use single::CurlDownloader;

use std::io::Write;
use std::time::Duration;

use crate::resolver::ResolvedDownload;
use crate::retry::FetchError;

/// Per-request curl limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurlOptions {
    /// Abort when no bytes arrive for this long.
    pub stall_timeout: Duration,
    pub connect_timeout: Duration,
    /// Hard wall-clock limit for the whole transfer.
    pub transfer_timeout: Duration,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            stall_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
            transfer_timeout: Duration::from_secs(600),
        }
    }
}

/// Fetches a resolved download into `sink`, returning the bytes written.
/// Any transport error or non-2xx status is an error; the caller decides
/// whether to retry.
pub trait Downloader: Send + Sync {
    fn fetch(&self, source: &ResolvedDownload, sink: &mut dyn Write) -> Result<u64, FetchError>;
}
