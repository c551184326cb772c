//! Mirror-list fallback with skip-if-already-valid.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::atomic::destination_exists;
use super::client::HttpClient;
use super::error::DownloadError;
use super::hash::verify_file;
use super::progress::SharedProgress;
use super::target::DownloadTarget;

impl HttpClient {
    /// Makes `target.dest()` hold the artifact, trying mirrors in order.
    ///
    /// 1. If the destination exists and satisfies a verifiable digest spec,
    ///    it is returned without any request.
    /// 2. Otherwise each mirror is fetched and installed in turn; the first
    ///    complete success wins.
    ///
    /// A failing mirror is logged and the next one tried. Its temp file is
    /// gone before the next attempt starts.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::EmptyMirrorList`] if there is nothing to try.
    /// - [`DownloadError::AlreadyExists`] / [`DownloadError::Cancelled`]
    ///   immediately, without trying further mirrors.
    /// - Otherwise the error of the **last** mirror once all have failed.
    #[must_use = "acquire result contains the installed path"]
    #[instrument(skip(self, target, progress, cancel), fields(dest = %target.dest().display(), mirrors = target.mirrors().len()))]
    pub async fn acquire(
        &self,
        target: &DownloadTarget,
        progress: Option<SharedProgress>,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, DownloadError> {
        let dest = target.dest();

        if target.digests().is_verifiable()
            && destination_exists(dest).await?
            && verify_file(dest, target.digests()).await?
        {
            info!("destination already valid, skipping download");
            return Ok(dest.to_path_buf());
        }

        let mut last_error = None;
        for (index, url) in target.mirrors().iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(DownloadError::cancelled(url.as_str()));
            }
            debug!(mirror = index, url = %url, "trying mirror");

            // The artifact is dropped (temp file deleted) at the end of each
            // iteration unless it was installed.
            let attempt = match self.fetch_to_temp(url, target, progress.clone(), cancel).await {
                Ok(artifact) => artifact.install(dest, Some(target.mode())).await,
                Err(e) => Err(e),
            };

            match attempt {
                Ok(path) => {
                    info!(url = %url, path = %path.display(), "installed from mirror");
                    return Ok(path);
                }
                Err(e) if e.is_hard_stop() => return Err(e),
                Err(e) => {
                    warn!(mirror = index, url = %url, error = %e, "mirror failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DownloadError::empty_mirror_list(dest)))
    }
}
