//! Concurrent installer for a manifest of files.
//!
//! [`BatchInstaller`] classifies each entry for the active [`Role`], checks
//! every eligible path before starting anything, then runs one task per entry
//! through [`HttpClient::acquire`] with a semaphore bounding how many transfer
//! at once. Every task returns its own result; the batch joins all of them
//! before deciding the outcome, and only then applies the overlay.
//!
//! # Example
//!
//! ```no_run
//! use installer_core::download::HttpClient;
//! use installer_core::pack::{BatchInstaller, BatchOptions, ManifestEntry, Overlay, Role};
//! use std::path::Path;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let installer = BatchInstaller::new(HttpClient::new(), BatchOptions::new(Role::Server))?;
//! let files = vec![ManifestEntry::new("mods/a.jar").with_download("https://example.com/a.jar")];
//! let report = installer
//!     .install_batch(&files, |_| true, Path::new("./server"), &Overlay::new(), &CancellationToken::new())
//!     .await?;
//! println!("Installed: {}, warnings: {}", report.installed.len(), report.warnings.len());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::error::InstallError;
use super::manifest::{EnvSupport, ManifestEntry, Role};
use super::overlay::Overlay;
use super::path::resolve_inside;
use crate::download::{DownloadError, HttpClient, SharedProgress};

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
const MAX_CONCURRENCY: usize = 100;

/// Default number of simultaneous transfers.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Settings for one [`BatchInstaller`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub role: Role,
    pub concurrency: usize,
}

impl BatchOptions {
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::new(Role::default())
    }
}

/// An optional entry that failed without failing the batch.
#[derive(Debug)]
pub struct InstallWarning {
    pub path: String,
    pub error: DownloadError,
}

impl fmt::Display for InstallWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skipped optional {}: {}", self.path, self.error)
    }
}

/// Outcome of a successful batch.
#[derive(Debug, Default)]
pub struct InstallReport {
    /// Absolute paths now holding a verified artifact, in manifest order.
    pub installed: Vec<PathBuf>,
    /// Entries not attempted (unsupported for the role or optional and declined).
    pub skipped: Vec<String>,
    /// Optional entries that failed.
    pub warnings: Vec<InstallWarning>,
    /// Files written by the overlay step.
    pub overlay_files: usize,
}

/// Builds a progress observer for one entry, or `None` for no reporting.
pub type EntryProgress = Arc<dyn Fn(&ManifestEntry) -> Option<SharedProgress> + Send + Sync>;

/// Runs the per-file downloads of a manifest concurrently.
#[derive(Clone)]
pub struct BatchInstaller {
    client: HttpClient,
    options: BatchOptions,
    entry_progress: Option<EntryProgress>,
}

impl fmt::Debug for BatchInstaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchInstaller")
            .field("options", &self.options)
            .field("entry_progress", &self.entry_progress.is_some())
            .finish_non_exhaustive()
    }
}

/// An entry that passed classification and the path check.
struct Planned<'a> {
    entry: &'a ManifestEntry,
    dest: PathBuf,
    required: bool,
}

impl BatchInstaller {
    /// Creates an installer sharing `client`'s connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::InvalidConcurrency`] if `options.concurrency`
    /// is outside 1-100.
    #[instrument(level = "debug", skip(client))]
    pub fn new(client: HttpClient, options: BatchOptions) -> Result<Self, InstallError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&options.concurrency) {
            return Err(InstallError::InvalidConcurrency {
                value: options.concurrency,
                min: MIN_CONCURRENCY,
                max: MAX_CONCURRENCY,
            });
        }
        Ok(Self {
            client,
            options,
            entry_progress: None,
        })
    }

    /// Attaches a factory producing one progress observer per started entry.
    #[must_use]
    pub fn with_entry_progress(mut self, factory: EntryProgress) -> Self {
        self.entry_progress = Some(factory);
        self
    }

    #[must_use]
    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Installs every eligible entry under `root`, then applies `overlay`.
    ///
    /// `include_optional` decides, per optional entry, whether to attempt it.
    ///
    /// # Errors
    ///
    /// - [`InstallError::PathEscape`] before any download if an eligible entry
    ///   (required or optional) would leave `root`.
    /// - [`InstallError::Entry`] for the first failed required entry in
    ///   manifest order, once every task has finished.
    /// - [`InstallError::Cancelled`] if `cancel` fired and stopped at least
    ///   one entry.
    /// - Overlay errors from [`Overlay::apply`].
    #[instrument(skip(self, files, include_optional, overlay, cancel), fields(root = %root.display(), role = %self.options.role, files = files.len()))]
    pub async fn install_batch<P>(
        &self,
        files: &[ManifestEntry],
        include_optional: P,
        root: &Path,
        overlay: &Overlay,
        cancel: &CancellationToken,
    ) -> Result<InstallReport, InstallError>
    where
        P: Fn(&ManifestEntry) -> bool,
    {
        let mut report = InstallReport::default();
        let plan = self.plan(files, &include_optional, root, &mut report)?;
        info!(
            eligible = plan.len(),
            skipped = report.skipped.len(),
            "starting batch install"
        );

        let semaphore = Arc::new(Semaphore::new(self.options.concurrency));
        let mut handles = Vec::with_capacity(plan.len());
        for planned in &plan {
            let target = planned.entry.to_target(planned.dest.clone());
            let client = self.client.clone();
            let semaphore = Arc::clone(&semaphore);
            let token = cancel.child_token();
            let progress = self
                .entry_progress
                .as_ref()
                .and_then(|factory| factory(planned.entry));

            handles.push(tokio::spawn(async move {
                // Permit is dropped when this block exits (RAII)
                let _permit = tokio::select! {
                    biased;
                    () = token.cancelled() => {
                        return Err(DownloadError::cancelled(target.dest().display().to_string()));
                    }
                    permit = semaphore.acquire_owned() => permit
                        .map_err(|_| DownloadError::cancelled(target.dest().display().to_string()))?,
                };
                client.acquire(&target, progress, &token).await
            }));
        }

        debug!(task_count = handles.len(), "waiting for installs to complete");

        // Join everything before looking at any result.
        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            outcomes.push(handle.await);
        }

        // Only a task that actually stopped makes the batch cancelled; a
        // token fired after every transfer finished changes nothing.
        if outcomes
            .iter()
            .any(|outcome| matches!(outcome, Ok(Err(DownloadError::Cancelled { .. }))))
        {
            warn!("batch install cancelled");
            return Err(InstallError::Cancelled);
        }

        let mut fatal = None;
        for (planned, outcome) in plan.iter().zip(outcomes) {
            let path = &planned.entry.path;
            match outcome {
                Ok(Ok(installed)) => report.installed.push(installed),
                Ok(Err(error)) if planned.required => {
                    warn!(path = %path, error = %error, "required entry failed");
                    fatal.get_or_insert_with(|| InstallError::entry(path, error));
                }
                Ok(Err(error)) => {
                    warn!(path = %path, error = %error, "skipped optional entry after failure");
                    report.warnings.push(InstallWarning {
                        path: path.clone(),
                        error,
                    });
                }
                Err(source) => {
                    warn!(path = %path, error = %source, "install task panicked");
                    fatal.get_or_insert_with(|| InstallError::Join {
                        path: path.clone(),
                        source,
                    });
                }
            }
        }
        if let Some(error) = fatal {
            return Err(error);
        }

        report.overlay_files = overlay.apply(root).await?;
        info!(
            installed = report.installed.len(),
            skipped = report.skipped.len(),
            warnings = report.warnings.len(),
            overlay_files = report.overlay_files,
            "batch install complete"
        );
        Ok(report)
    }

    /// Classifies entries and resolves eligible paths; nothing runs yet.
    fn plan<'a, P>(
        &self,
        files: &'a [ManifestEntry],
        include_optional: &P,
        root: &Path,
        report: &mut InstallReport,
    ) -> Result<Vec<Planned<'a>>, InstallError>
    where
        P: Fn(&ManifestEntry) -> bool,
    {
        let mut plan = Vec::with_capacity(files.len());
        for entry in files {
            let required = match entry.support_for(self.options.role) {
                EnvSupport::Unsupported => {
                    debug!(path = %entry.path, "unsupported for role, skipping");
                    report.skipped.push(entry.path.clone());
                    continue;
                }
                EnvSupport::Optional if !include_optional(entry) => {
                    debug!(path = %entry.path, "optional entry declined");
                    report.skipped.push(entry.path.clone());
                    continue;
                }
                EnvSupport::Optional => false,
                EnvSupport::Required => true,
            };
            let dest = resolve_inside(root, &entry.path)?;
            plan.push(Planned {
                entry,
                dest,
                required,
            });
        }
        Ok(plan)
    }
}
