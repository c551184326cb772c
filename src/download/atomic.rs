//! Moves a finished temp file to its destination exactly once.
//!
//! The destination is produced by hard-linking the temp file into place and
//! then unlinking the temp name. When linking is impossible (the paths sit on
//! different filesystems, or the filesystem has no hard links) the bytes are
//! copied into a freshly created file and the source is removed only after
//! the copy is complete. Both paths refuse an existing destination, so an
//! existing file is never overwritten, even by a racing installer.

mod cross_device;

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

pub use cross_device::is_cross_device;
use cross_device::is_link_unsupported;

use super::error::DownloadError;

/// Installs `temp` at `dest`, then applies `mode` (best-effort).
///
/// Parent directories of `dest` are created only after `dest` is known to be
/// absent. Of several concurrent calls for the same `dest` at most one
/// succeeds; the others get [`DownloadError::AlreadyExists`] and keep their
/// temp file.
///
/// # Errors
///
/// - [`DownloadError::AlreadyExists`] if `dest` is occupied.
/// - [`DownloadError::Io`] if the move fails for any reason other than a
///   device boundary or missing link support, or if the fallback copy fails
///   (the partial copy is removed first).
#[instrument(level = "debug", skip_all, fields(temp = %temp.display(), dest = %dest.display()))]
pub async fn install(temp: &Path, dest: &Path, mode: Option<u32>) -> Result<(), DownloadError> {
    install_with(temp, dest, mode, move_no_replace).await
}

/// Moves `from` to `to`, failing with `ErrorKind::AlreadyExists` instead of
/// replacing an existing `to`.
pub(crate) async fn move_no_replace(from: PathBuf, to: PathBuf) -> io::Result<()> {
    tokio::fs::hard_link(&from, &to).await?;
    if let Err(e) = tokio::fs::remove_file(&from).await {
        // `to` is complete; the second name is only a leak.
        warn!(path = %from.display(), error = %e, "failed to remove temp name after link");
    }
    Ok(())
}

/// [`install`] with the move step supplied by the caller. The step must
/// refuse an existing destination with `ErrorKind::AlreadyExists`.
pub(crate) async fn install_with<F, Fut>(
    temp: &Path,
    dest: &Path,
    mode: Option<u32>,
    move_into_place: F,
) -> Result<(), DownloadError>
where
    F: FnOnce(PathBuf, PathBuf) -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if destination_exists(dest).await? {
        return Err(DownloadError::already_exists(dest));
    }

    if let Some(parent) = dest.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DownloadError::io(parent, e))?;
    }

    match move_into_place(temp.to_path_buf(), dest.to_path_buf()).await {
        Ok(()) => debug!("moved into place"),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(DownloadError::already_exists(dest));
        }
        Err(e) if is_cross_device(&e) || is_link_unsupported(&e) => {
            debug!(error = %e, "cannot link into place, copying instead");
            copy_then_remove(temp, dest).await?;
        }
        Err(e) => return Err(DownloadError::io(dest, e)),
    }

    if let Some(mode) = mode {
        apply_mode(dest, mode).await;
    }
    Ok(())
}

/// Returns true if anything (file, directory, dangling symlink) sits at `path`.
pub(crate) async fn destination_exists(path: &Path) -> Result<bool, DownloadError> {
    match tokio::fs::symlink_metadata(path).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(DownloadError::io(path, e)),
    }
}

async fn copy_then_remove(temp: &Path, dest: &Path) -> Result<(), DownloadError> {
    let mut dst = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .await
    {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(DownloadError::already_exists(dest));
        }
        Err(e) => return Err(DownloadError::io(dest, e)),
    };

    let copied = async {
        let mut src = File::open(temp).await?;
        let n = tokio::io::copy(&mut src, &mut dst).await?;
        dst.flush().await?;
        dst.sync_all().await?;
        Ok::<u64, io::Error>(n)
    }
    .await;
    drop(dst);

    match copied {
        Ok(bytes) => debug!(bytes, "copied across devices"),
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(dest).await {
                warn!(path = %dest.display(), error = %cleanup, "failed to remove partial copy");
            }
            return Err(DownloadError::io(dest, e));
        }
    }

    if let Err(e) = tokio::fs::remove_file(temp).await {
        // The destination is complete; a stray source is only a leak.
        warn!(path = %temp.display(), error = %e, "failed to remove temp source after copy");
    }
    Ok(())
}

#[cfg(unix)]
async fn apply_mode(dest: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(e) = tokio::fs::set_permissions(dest, std::fs::Permissions::from_mode(mode)).await
    {
        warn!(path = %dest.display(), mode = format_args!("{mode:o}"), error = %e, "failed to set file mode");
    }
}

#[cfg(not(unix))]
async fn apply_mode(dest: &Path, mode: u32) {
    debug!(path = %dest.display(), mode = format_args!("{mode:o}"), "file modes are not applied on this platform");
}
