//! Single-source HTTP downloader.
//!
//! [`HttpClient`] performs one GET, validates status and length, streams the
//! body through the hash verifier into a private temp file next to the
//! destination, and either hands that temp file back ([`TempArtifact`]) or
//! installs it atomically ([`HttpClient::download`]).

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::TryStreamExt;
use reqwest::{Client, StatusCode};
use tempfile::TempPath;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use url::Url;

use super::atomic;
use super::constants::{CONNECT_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS, TEMP_SUFFIX};
use super::error::DownloadError;
use super::hash::{VerifyError, copy_verified};
use super::progress::{ProgressReader, SharedProgress};
use super::target::DownloadTarget;
use crate::user_agent;

/// Settings fixed when the HTTP client is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Value of the User-Agent header on every request.
    pub user_agent: String,
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout, body included.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: user_agent::default_user_agent(),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

/// HTTP client for verified, atomic downloads.
///
/// Create it once and clone it freely: clones share one connection pool, so
/// concurrent tasks can issue requests without extra locking.
///
/// # Example
///
/// ```no_run
/// use installer_core::download::{DownloadTarget, HttpClient};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let target = DownloadTarget::new("https://example.com/server.jar", "./server.jar");
/// let path = client
///     .download("https://example.com/server.jar", &target, None, &CancellationToken::new())
///     .await?;
/// println!("Installed: {}", path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a client with [`ClientConfig::default`].
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static default
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_config(&ClientConfig::default())
            .expect("failed to build HTTP client with static configuration")
    }

    /// Creates a client from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialised.
    #[instrument(level = "debug")]
    pub fn with_config(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    /// Downloads `url` into a private temp file beside `target.dest()`.
    ///
    /// The returned [`TempArtifact`] still owns the file and deletes it when
    /// dropped; call [`TempArtifact::install`] to move it into place.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::InvalidUrl`] before any I/O for a malformed URL.
    /// - [`DownloadError::HttpStatus`] for any status other than 200.
    /// - [`DownloadError::ContentLengthMismatch`] when the declared length
    ///   disagrees with the expected size (checked before the body is read)
    ///   or the body length disagrees with the expected size.
    /// - [`DownloadError::HashMismatch`] when a digest does not match.
    /// - [`DownloadError::Network`]/[`DownloadError::Timeout`]/[`DownloadError::Io`]
    ///   on transfer or disk failures.
    /// - [`DownloadError::Cancelled`] when `cancel` fires.
    ///
    /// The temp file is removed on every error path.
    #[instrument(skip(self, target, progress, cancel), fields(url = %url, dest = %target.dest().display()))]
    pub async fn fetch_to_temp(
        &self,
        url: &str,
        target: &DownloadTarget,
        progress: Option<SharedProgress>,
        cancel: &CancellationToken,
    ) -> Result<TempArtifact, DownloadError> {
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DownloadError::cancelled(url)),
            response = self.send_get(url) => response?,
        };

        let declared = response.content_length();
        let size = match (target.expected_size(), declared) {
            (Some(expected), Some(actual)) if expected != actual => {
                return Err(DownloadError::content_length_mismatch(url, actual, expected));
            }
            (Some(expected), _) => Some(expected),
            (None, declared) => declared,
        };
        debug!(?size, "response accepted");

        let (file, temp_path) = create_temp_beside(target.dest()).await?;
        let mut file = tokio::fs::File::from_std(file);

        let body = StreamReader::new(Box::pin(response.bytes_stream().map_err(io::Error::other)));
        let mut reader = ProgressReader::new(body, size, progress);

        let copied = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DownloadError::cancelled(url)),
            copied = copy_verified(&mut reader, target.digests(), Some(&mut file)) => {
                copied.map_err(|e| map_verify_error(e, url, &temp_path))?
            }
        };
        drop(file);

        if let Some(expected) = target.expected_size()
            && copied != expected
        {
            return Err(DownloadError::content_length_mismatch(url, copied, expected));
        }
        reader.finish();

        debug!(path = %temp_path.display(), bytes = copied, "downloaded to temp file");
        Ok(TempArtifact {
            path: temp_path,
            bytes: copied,
        })
    }

    /// Downloads `url` and installs it at `target.dest()`.
    ///
    /// # Errors
    ///
    /// Everything [`fetch_to_temp`](Self::fetch_to_temp) returns, plus the
    /// Atomic Installer's [`DownloadError::AlreadyExists`] and
    /// [`DownloadError::Io`].
    #[must_use = "download result contains the installed path"]
    #[instrument(skip(self, target, progress, cancel), fields(url = %url, dest = %target.dest().display()))]
    pub async fn download(
        &self,
        url: &str,
        target: &DownloadTarget,
        progress: Option<SharedProgress>,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, DownloadError> {
        let artifact = self.fetch_to_temp(url, target, progress, cancel).await?;
        let bytes = artifact.len();
        let path = artifact.install(target.dest(), Some(target.mode())).await?;
        info!(path = %path.display(), bytes, "download complete");
        Ok(path)
    }

    async fn send_get(&self, url: &str) -> Result<reqwest::Response, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::from_transport(url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }

}

/// A verified download sitting in its private temp file.
///
/// Dropping it deletes the file.
#[derive(Debug)]
pub struct TempArtifact {
    path: TempPath,
    bytes: u64,
}

impl TempArtifact {
    /// Location of the temp file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of bytes written.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.bytes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes == 0
    }

    /// Moves the file to `dest` through the Atomic Installer.
    ///
    /// # Errors
    ///
    /// See [`atomic::install`]. On error the temp file is removed.
    pub async fn install(self, dest: &Path, mode: Option<u32>) -> Result<PathBuf, DownloadError> {
        atomic::install(&self.path, dest, mode).await?;
        // Renamed or copied away; nothing left to delete.
        let _ = self.path.keep();
        Ok(dest.to_path_buf())
    }
}

/// Creates `.<file name>.<random>.downloading` in the destination directory
/// so the later rename stays on one filesystem.
async fn create_temp_beside(dest: &Path) -> Result<(std::fs::File, TempPath), DownloadError> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| DownloadError::io(&dir, e))?;

    let name = dest
        .file_name()
        .map_or_else(|| "artifact".to_string(), |n| n.to_string_lossy().into_owned());
    let temp = tempfile::Builder::new()
        .prefix(&format!(".{name}."))
        .suffix(TEMP_SUFFIX)
        .tempfile_in(&dir)
        .map_err(|e| DownloadError::io(&dir, e))?;
    Ok(temp.into_parts())
}

/// Attaches url/path context to a copy failure.
fn map_verify_error(err: VerifyError, url: &str, temp: &Path) -> DownloadError {
    match err {
        VerifyError::Digest(e) => e,
        VerifyError::Write(e) => DownloadError::io(temp, e),
        VerifyError::Read(e) => map_read_error(e, url, temp),
    }
}

/// Body read errors arrive as `io::Error` wrapping the reqwest error.
fn map_read_error(err: io::Error, url: &str, temp: &Path) -> DownloadError {
    let is_transport = err
        .get_ref()
        .is_some_and(|inner| inner.is::<reqwest::Error>());
    if !is_transport {
        return DownloadError::io(temp, err);
    }
    match err.into_inner().map(|inner| inner.downcast::<reqwest::Error>()) {
        Some(Ok(source)) => DownloadError::from_transport(url, *source),
        Some(Err(other)) => DownloadError::io(temp, io::Error::other(other)),
        None => DownloadError::io(temp, io::Error::other("body read failed")),
    }
}
