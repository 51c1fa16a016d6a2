//! Single-stream HTTP GET downloader.

use std::io::{self, Write};

use super::{CurlOptions, Downloader};
use crate::resolver::ResolvedDownload;
use crate::retry::FetchError;

#[derive(Debug, Clone, Default)]
pub struct CurlDownloader {
    options: CurlOptions,
}

impl CurlDownloader {
    pub fn new(options: CurlOptions) -> Self {
        Self { options }
    }
}

impl Downloader for CurlDownloader {
    fn fetch(&self, source: &ResolvedDownload, sink: &mut dyn Write) -> Result<u64, FetchError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(&source.url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.options.connect_timeout)?;
        // Stall detection: abort if fewer than 1 byte/s arrives for the stall window.
        easy.low_speed_limit(1)?;
        easy.low_speed_time(self.options.stall_timeout)?;
        easy.timeout(self.options.transfer_timeout)?;

        if !source.headers.is_empty() {
            let mut list = curl::easy::List::new();
            for (k, v) in &source.headers {
                list.append(&format!("{}: {}", k.trim(), v.trim()))?;
            }
            easy.http_headers(list)?;
        }

        let mut written = 0u64;
        let mut sink_error: Option<io::Error> = None;
        let perform_result = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| match sink.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    sink_error = Some(e);
                    Ok(0) // abort transfer
                }
            })?;
            transfer.perform()
        };
        if let Err(e) = perform_result {
            if e.is_write_error() {
                if let Some(io_err) = sink_error.take() {
                    return Err(FetchError::Storage(io_err));
                }
            }
            return Err(FetchError::Curl(e));
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(FetchError::Http(code));
        }
        sink.flush().map_err(FetchError::Storage)?;
        Ok(written)
    }
}
