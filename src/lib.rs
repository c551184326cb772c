//! Installer Core Library
//!
//! This library fetches distributable artifacts, verifies them against their
//! expected digests and installs them into a directory tree without ever
//! leaving a partially written destination behind.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`download`] - Hash verification, atomic install, single-source and
//!   mirror-fallback downloads
//! - [`pack`] - Concurrent batch installs of a pack manifest, overlays and
//!   `.mrpack` archives
//!
//! Version resolution and running downloaded installers are left to callers;
//! they hand this crate fully resolved URLs, digests and destinations.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod pack;
mod user_agent;

// Re-export commonly used types
pub use download::{
    ClientConfig, DigestSpec, DownloadError, DownloadTarget, HttpClient, ProgressEvent,
    ProgressObserver, SharedProgress,
};
pub use pack::{
    BatchInstaller, BatchOptions, DEFAULT_CONCURRENCY, InstallError, InstallReport,
    ManifestEntry, Overlay, PackArchive, Role,
};
