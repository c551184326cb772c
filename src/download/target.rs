//! Fully resolved description of one artifact to acquire.

use std::path::{Path, PathBuf};

use super::constants::DEFAULT_FILE_MODE;
use super::hash::DigestSpec;

/// Where an artifact comes from, what it must hash to, and where it goes.
///
/// Built once with the by-value builder methods and read-only afterwards.
///
/// ```
/// use installer_core::download::{DigestSpec, DownloadTarget};
///
/// let target = DownloadTarget::new("https://example.com/server.jar", "./server.jar")
///     .with_mirror("https://mirror.example.org/server.jar")
///     .with_expected_size(1024)
///     .with_digests(DigestSpec::new().with("sha1", "0123abcd"));
/// assert_eq!(target.mirrors().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    mirrors: Vec<String>,
    expected_size: Option<u64>,
    digests: DigestSpec,
    dest: PathBuf,
    mode: u32,
}

impl DownloadTarget {
    /// A target with a single primary URL.
    pub fn new(url: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self::from_mirrors(vec![url.into()], dest)
    }

    /// A target tried against `mirrors` in order. The list may be empty, in
    /// which case only an already valid destination can satisfy it.
    pub fn from_mirrors(mirrors: Vec<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            mirrors,
            expected_size: None,
            digests: DigestSpec::new(),
            dest: dest.into(),
            mode: DEFAULT_FILE_MODE,
        }
    }

    /// Appends an alternative URL after the existing ones.
    #[must_use]
    pub fn with_mirror(mut self, url: impl Into<String>) -> Self {
        self.mirrors.push(url.into());
        self
    }

    #[must_use]
    pub fn with_expected_size(mut self, size: u64) -> Self {
        self.expected_size = Some(size);
        self
    }

    #[must_use]
    pub fn with_digests(mut self, digests: DigestSpec) -> Self {
        self.digests = digests;
        self
    }

    /// Permission bits applied once the file is installed, replacing
    /// [`DEFAULT_FILE_MODE`].
    #[must_use]
    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn mirrors(&self) -> &[String] {
        &self.mirrors
    }

    #[must_use]
    pub fn expected_size(&self) -> Option<u64> {
        self.expected_size
    }

    #[must_use]
    pub fn digests(&self) -> &DigestSpec {
        &self.digests
    }

    #[must_use]
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    #[must_use]
    pub fn mode(&self) -> u32 {
        self.mode
    }
}
