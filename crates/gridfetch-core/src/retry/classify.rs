//! Classify task-attempt errors for logging and the run summary.

use std::fmt;

use super::error::FetchError;
use crate::resolver::ResolveError;

/// High-level classification of an attempt failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    /// Resolver call failed for any reason.
    Resolve,
    /// Operation timed out (connect/stall/transfer).
    Timeout,
    /// Server asked us to slow down (429, 503).
    Throttled,
    /// Network-level failure (connection reset, DNS, etc.).
    Connection,
    /// Any other non-2xx download status.
    Http,
    /// Archive corrupt or extraction failed.
    Archive,
    /// Local disk I/O.
    Storage,
    /// Transport errors that fit no other bucket.
    Other,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Resolve => "resolve",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Throttled => "throttled",
            ErrorKind::Connection => "connection",
            ErrorKind::Http => "http",
            ErrorKind::Archive => "archive",
            ErrorKind::Storage => "storage",
            ErrorKind::Other => "other",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a download HTTP status code.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        _ => ErrorKind::Http,
    }
}

/// Classify a curl error.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

/// Classify an attempt error into an ErrorKind.
pub fn classify(e: &FetchError) -> ErrorKind {
    match e {
        FetchError::Resolve(ResolveError::Transport(ce)) if ce.is_operation_timedout() => {
            ErrorKind::Timeout
        }
        FetchError::Resolve(_) => ErrorKind::Resolve,
        FetchError::Curl(ce) => classify_curl_error(ce),
        FetchError::Http(code) => classify_http_status(*code),
        FetchError::Unpack(_) => ErrorKind::Archive,
        FetchError::Storage(_) => ErrorKind::Storage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::UnpackError;

    #[test]
    fn http_429_and_503_throttled() {
        assert_eq!(classify_http_status(429), ErrorKind::Throttled);
        assert_eq!(classify_http_status(503), ErrorKind::Throttled);
    }

    #[test]
    fn other_statuses_are_http() {
        assert_eq!(classify_http_status(500), ErrorKind::Http);
        assert_eq!(classify_http_status(404), ErrorKind::Http);
        assert_eq!(classify(&FetchError::Http(403)), ErrorKind::Http);
    }

    #[test]
    fn resolver_and_archive_errors() {
        let e = FetchError::Resolve(ResolveError::Rejected {
            status: 400,
            message: "bad region".to_string(),
        });
        assert_eq!(classify(&e), ErrorKind::Resolve);
        assert_eq!(classify(&FetchError::Unpack(UnpackError::Empty)), ErrorKind::Archive);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(classify(&FetchError::Storage(io)), ErrorKind::Storage);
    }

    #[test]
    fn curl_timeout_and_connection() {
        // CURLE_OPERATION_TIMEDOUT = 28, CURLE_COULDNT_CONNECT = 7
        assert_eq!(classify_curl_error(&curl::Error::new(28)), ErrorKind::Timeout);
        assert_eq!(classify_curl_error(&curl::Error::new(7)), ErrorKind::Connection);
        assert_eq!(
            classify(&FetchError::Resolve(ResolveError::Transport(curl::Error::new(28)))),
            ErrorKind::Timeout
        );
    }
}
