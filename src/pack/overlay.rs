//! Bundled file tree copied over the install root after the downloads.

use std::path::Path;

use tracing::{debug, instrument};

use super::error::InstallError;
use super::path::resolve_inside;

/// Kind of an overlay entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayKind {
    Directory,
    File(Vec<u8>),
}

/// One directory or file of an overlay, relative to the install root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayEntry {
    pub path: String,
    pub kind: OverlayKind,
    /// Unix permission bits recorded in the pack, if any.
    pub mode: Option<u32>,
}

/// Ordered set of overlay entries.
///
/// Applied in two passes, directories then files, each in insertion order.
/// Files overwrite whatever is at their path; this step is not atomic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overlay {
    entries: Vec<OverlayEntry>,
}

impl Overlay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_dir(&mut self, path: impl Into<String>, mode: Option<u32>) {
        self.entries.push(OverlayEntry {
            path: path.into(),
            kind: OverlayKind::Directory,
            mode,
        });
    }

    pub fn push_file(&mut self, path: impl Into<String>, contents: Vec<u8>, mode: Option<u32>) {
        self.entries.push(OverlayEntry {
            path: path.into(),
            kind: OverlayKind::File(contents),
            mode,
        });
    }

    /// Appends every entry of `other` after the current ones.
    pub fn extend(&mut self, other: &Overlay) {
        self.entries.extend(other.entries.iter().cloned());
    }

    #[must_use]
    pub fn entries(&self) -> &[OverlayEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the overlay under `root`. Returns the number of files written.
    ///
    /// # Errors
    ///
    /// - [`InstallError::PathEscape`] for any entry leaving `root`; checked
    ///   for every entry before anything is written.
    /// - [`InstallError::Overlay`] for the first write that fails.
    #[instrument(level = "debug", skip(self), fields(root = %root.display(), entries = self.entries.len()))]
    pub async fn apply(&self, root: &Path) -> Result<usize, InstallError> {
        let resolved = self
            .entries
            .iter()
            .map(|entry| resolve_inside(root, &entry.path).map(|dest| (entry, dest)))
            .collect::<Result<Vec<_>, _>>()?;

        for (entry, dest) in &resolved {
            if entry.kind == OverlayKind::Directory {
                tokio::fs::create_dir_all(dest)
                    .await
                    .map_err(|e| InstallError::overlay(dest, e))?;
                // Directories stay traversable whatever the recorded bits.
                if let Some(mode) = entry.mode {
                    set_mode(dest, mode | 0o111).await?;
                }
            }
        }

        let mut written = 0;
        for (entry, dest) in &resolved {
            let OverlayKind::File(contents) = &entry.kind else {
                continue;
            };
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| InstallError::overlay(parent, e))?;
            }
            tokio::fs::write(dest, contents)
                .await
                .map_err(|e| InstallError::overlay(dest, e))?;
            if let Some(mode) = entry.mode {
                set_mode(dest, mode).await?;
            }
            debug!(path = %dest.display(), bytes = contents.len(), "overlay file written");
            written += 1;
        }
        Ok(written)
    }
}

#[cfg(unix)]
async fn set_mode(path: &Path, mode: u32) -> Result<(), InstallError> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode & 0o7777))
        .await
        .map_err(|e| InstallError::overlay(path, e))
}

#[cfg(not(unix))]
async fn set_mode(_path: &Path, _mode: u32) -> Result<(), InstallError> {
    Ok(())
}
