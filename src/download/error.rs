//! Error types for the download module.
//!
//! Every variant carries the structured fields a caller needs to branch on
//! the failure kind without parsing messages.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching, verifying or installing an artifact.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// The server answered with anything other than `200 OK`.
    #[error("unexpected HTTP status {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The declared content length disagrees with the caller's expected size.
    #[error("unexpected content length {actual} from {url}, expected {expected}")]
    ContentLengthMismatch {
        /// The URL whose response declared the length.
        url: String,
        /// Length declared by the server.
        actual: u64,
        /// Length the caller expected.
        expected: u64,
    },

    /// A digest of the transferred bytes did not match the expected value.
    #[error("unexpected {algorithm} hash {actual}, expected {expected}")]
    HashMismatch {
        /// Algorithm name as used in the digest spec (e.g. `sha1`).
        algorithm: &'static str,
        /// Hex digest computed from the bytes.
        actual: String,
        /// Hex digest the caller expected.
        expected: String,
    },

    /// The destination is already occupied and will not be overwritten.
    #[error("target already exists: {path}")]
    AlreadyExists {
        /// The occupied destination.
        path: PathBuf,
    },

    /// No candidate URL was given for a destination that needs downloading.
    #[error("no download source for {path}")]
    EmptyMirrorList {
        /// The destination that could not be satisfied.
        path: PathBuf,
    },

    /// File system error (temp file, rename, cross-device copy, etc.)
    #[error("IO error at {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The operation was cancelled before it completed.
    #[error("download cancelled: {url}")]
    Cancelled {
        /// The URL being transferred when cancellation was observed.
        url: String,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Maps a transport error, distinguishing timeouts.
    pub fn from_transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::timeout(url)
        } else {
            Self::network(url, source)
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a content length mismatch error.
    pub fn content_length_mismatch(url: impl Into<String>, actual: u64, expected: u64) -> Self {
        Self::ContentLengthMismatch {
            url: url.into(),
            actual,
            expected,
        }
    }

    /// Creates a hash mismatch error.
    pub fn hash_mismatch(
        algorithm: &'static str,
        actual: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::HashMismatch {
            algorithm,
            actual: actual.into(),
            expected: expected.into(),
        }
    }

    /// Creates an already-exists error.
    pub fn already_exists(path: impl Into<PathBuf>) -> Self {
        Self::AlreadyExists { path: path.into() }
    }

    /// Creates an empty mirror list error.
    pub fn empty_mirror_list(path: impl Into<PathBuf>) -> Self {
        Self::EmptyMirrorList { path: path.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a cancellation error.
    pub fn cancelled(url: impl Into<String>) -> Self {
        Self::Cancelled { url: url.into() }
    }

    /// Returns true when the next mirror must not be tried after this error.
    ///
    /// An occupied destination stays occupied whatever the source, and a
    /// cancelled call must stop issuing requests.
    #[must_use]
    pub fn is_hard_stop(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. } | Self::Cancelled { .. })
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs the
// url or path the source errors don't carry.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_http_status_display() {
        let error = DownloadError::http_status("https://example.com/server.jar", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(
            msg.contains("https://example.com/server.jar"),
            "Expected URL in: {msg}"
        );
    }

    #[test]
    fn test_download_error_hash_mismatch_carries_fields() {
        let error = DownloadError::hash_mismatch("sha1", "aaaa", "bbbb");
        assert_eq!(error.to_string(), "unexpected sha1 hash aaaa, expected bbbb");
        match error {
            DownloadError::HashMismatch {
                algorithm,
                actual,
                expected,
            } => {
                assert_eq!(algorithm, "sha1");
                assert_eq!(actual, "aaaa");
                assert_eq!(expected, "bbbb");
            }
            other => panic!("Expected HashMismatch, got: {other:?}"),
        }
    }

    #[test]
    fn test_download_error_content_length_display() {
        let error = DownloadError::content_length_mismatch("https://example.com/a", 10, 12);
        let msg = error.to_string();
        assert!(msg.contains("10"), "Expected actual length in: {msg}");
        assert!(msg.contains("12"), "Expected expected length in: {msg}");
    }

    #[test]
    fn test_download_error_io_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = DownloadError::io(PathBuf::from("/tmp/server.jar"), io_error);
        let msg = error.to_string();
        assert!(msg.contains("/tmp/server.jar"), "Expected path in: {msg}");
    }

    #[test]
    fn test_hard_stop_classification() {
        assert!(DownloadError::already_exists("/tmp/a").is_hard_stop());
        assert!(DownloadError::cancelled("https://example.com").is_hard_stop());
        assert!(!DownloadError::http_status("https://example.com", 500).is_hard_stop());
        assert!(!DownloadError::hash_mismatch("md5", "a", "b").is_hard_stop());
        assert!(!DownloadError::invalid_url("nope").is_hard_stop());
    }
}
