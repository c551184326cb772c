//! Verified, atomic artifact downloads.
//!
//! This module fetches one artifact over HTTP, checks it against the expected
//! digests while it streams to a private temp file, and moves it into place
//! without ever exposing a partially written destination.
//!
//! # Features
//!
//! - Streaming downloads hashed on the fly (md5, sha1, sha2 family)
//! - Mirror fallback with a skip when the destination already verifies
//! - Rename-based install with a copy fallback across filesystems
//! - Progress callbacks throttled to one per second
//! - Structured error types with full context
//!
//! # Example
//!
//! ```no_run
//! use installer_core::download::{DigestSpec, DownloadTarget, HttpClient};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let target = DownloadTarget::new("https://example.com/server.jar", "./server.jar")
//!     .with_mirror("https://mirror.example.org/server.jar")
//!     .with_digests(DigestSpec::new().with("sha1", "0123abcd"));
//! let path = client.acquire(&target, None, &CancellationToken::new()).await?;
//! println!("Installed: {}", path.display());
//! # Ok(())
//! # }
//! ```

pub mod atomic;
mod client;
pub mod constants;
mod error;
mod hash;
mod mirror;
mod progress;
mod target;

pub use atomic::{install, is_cross_device};
pub use client::{ClientConfig, HttpClient, TempArtifact};
pub use error::DownloadError;
pub use hash::{DigestSpec, HashAlgorithm, MultiHasher, VerifyError, copy_verified, verify_file};
pub use progress::{ProgressEvent, ProgressObserver, ProgressReader, SharedProgress};
pub use target::DownloadTarget;

// Note: no module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
