//! Compound package installs.
//!
//! A pack lists many files, each with its own mirrors, digests, size and
//! per-role classification, plus override trees copied over the result.
//! [`BatchInstaller`] downloads the files concurrently and [`PackArchive`]
//! reads them from a `.mrpack` zip.
//!
//! # Example
//!
//! ```no_run
//! use installer_core::download::HttpClient;
//! use installer_core::pack::{BatchInstaller, BatchOptions, PackArchive, Role};
//! use std::path::Path;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pack = PackArchive::open(Path::new("./pack.mrpack"))?;
//! let installer = BatchInstaller::new(HttpClient::new(), BatchOptions::new(Role::Server))?;
//! let report = pack
//!     .install(&installer, Path::new("./server"), |_| true, &CancellationToken::new())
//!     .await?;
//! for warning in &report.warnings {
//!     eprintln!("{warning}");
//! }
//! # Ok(())
//! # }
//! ```

mod archive;
mod batch;
mod error;
mod manifest;
mod overlay;
mod path;

pub use archive::{
    INDEX_FILE, PackArchive, SUPPORTED_FORMAT_VERSIONS, SUPPORTED_GAME, download_name,
};
pub use batch::{
    BatchInstaller, BatchOptions, DEFAULT_CONCURRENCY, EntryProgress, InstallReport,
    InstallWarning,
};
pub use error::InstallError;
pub use manifest::{EnvSupport, ManifestEntry, PackIndex, Role};
pub use overlay::{Overlay, OverlayEntry, OverlayKind};
pub use path::resolve_inside;
