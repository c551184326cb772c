//! Error types for pack and batch installs.

use std::path::PathBuf;

use thiserror::Error;

use crate::download::DownloadError;

/// Errors that fail a whole batch or pack install.
///
/// Per-entry download failures arrive wrapped in [`InstallError::Entry`] and
/// only when the entry was required; optional failures are reported as
/// warnings instead.
#[derive(Debug, Error)]
pub enum InstallError {
    /// A manifest or overlay path would resolve outside the install root.
    #[error("{path:?} is not a local path")]
    PathEscape {
        /// The offending relative path, as written in the pack.
        path: String,
    },

    /// A required entry could not be installed from any of its mirrors.
    #[error("failed to install {path}: {source}")]
    Entry {
        /// Relative path of the entry.
        path: String,
        /// Error of the last mirror tried.
        #[source]
        source: DownloadError,
    },

    /// Writing an overlay file or directory failed.
    #[error("failed to apply overlay at {path}: {source}")]
    Overlay {
        /// Absolute path being written.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Concurrency limit outside the accepted range.
    #[error("invalid concurrency value {value}: must be between {min} and {max}")]
    InvalidConcurrency {
        value: usize,
        min: usize,
        max: usize,
    },

    /// The pack index declares a format version this build cannot read.
    #[error("unsupported pack format version {version}, supports {supported:?}")]
    UnsupportedFormat {
        version: u32,
        supported: &'static [u32],
    },

    /// The pack targets a game other than Minecraft.
    #[error("unsupported game type {game:?}")]
    UnsupportedGame { game: String },

    /// The archive has no `modrinth.index.json`.
    #[error("pack archive has no modrinth.index.json")]
    MissingIndex,

    /// The index is not valid JSON or misses required fields.
    #[error("invalid pack index: {0}")]
    Index(#[from] serde_json::Error),

    /// The archive itself is unreadable.
    #[error("invalid pack archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// File system error outside the overlay step (opening the archive, etc.)
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The install was cancelled; entries already installed stay in place.
    #[error("install cancelled")]
    Cancelled,

    /// An install task panicked.
    #[error("install task for {path} failed: {source}")]
    Join {
        path: String,
        #[source]
        source: tokio::task::JoinError,
    },
}

impl InstallError {
    /// Creates a path escape error.
    pub fn path_escape(path: impl Into<String>) -> Self {
        Self::PathEscape { path: path.into() }
    }

    /// Creates an entry error.
    pub fn entry(path: impl Into<String>, source: DownloadError) -> Self {
        Self::Entry {
            path: path.into(),
            source,
        }
    }

    /// Creates an overlay error.
    pub fn overlay(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Overlay {
            path: path.into(),
            source,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
