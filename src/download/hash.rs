//! Streaming multi-algorithm hash verification.
//!
//! [`copy_verified`] copies a byte stream into an optional sink while feeding
//! the same bytes into one running digest per algorithm named in a
//! [`DigestSpec`], then compares the final hex digests with the expected ones.
//! Nothing here touches the filesystem except [`verify_file`], which only reads.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use super::constants::COPY_BUFFER_SIZE;
use super::error::DownloadError;

/// Digest algorithms understood by the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Every supported algorithm.
    pub const ALL: [Self; 6] = [
        Self::Md5,
        Self::Sha1,
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
    ];

    /// Looks up an algorithm by its manifest name. Unknown names yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "md5" => Some(Self::Md5),
            "sha1" => Some(Self::Sha1),
            "sha224" => Some(Self::Sha224),
            "sha256" => Some(Self::Sha256),
            "sha384" => Some(Self::Sha384),
            "sha512" => Some(Self::Sha512),
            _ => None,
        }
    }

    /// Manifest name of the algorithm.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    /// Hex digest of an in-memory buffer.
    #[must_use]
    pub fn hex_digest(self, data: &[u8]) -> String {
        let mut running = RunningDigest::new(self);
        running.update(data);
        running.finalize_hex()
    }
}

/// Expected digests keyed by algorithm name.
///
/// Keys outside [`HashAlgorithm`] are kept but ignored during verification so
/// manifests may carry algorithms this build does not know. Iteration follows
/// key order, which fixes the algorithm reported on a mismatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DigestSpec(BTreeMap<String, String>);

impl DigestSpec {
    /// An empty spec (no verification requested).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an expected digest, replacing any previous value for the name.
    #[must_use]
    pub fn with(mut self, algorithm: impl Into<String>, hex: impl Into<String>) -> Self {
        self.0.insert(algorithm.into(), hex.into());
        self
    }

    /// Returns true when no digest at all is listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true when at least one listed algorithm can be checked.
    #[must_use]
    pub fn is_verifiable(&self) -> bool {
        self.supported().next().is_some()
    }

    /// Expected value for an algorithm name, if listed.
    #[must_use]
    pub fn get(&self, algorithm: &str) -> Option<&str> {
        self.0.get(algorithm).map(String::as_str)
    }

    /// Recognised algorithms with their expected digests, in key order.
    pub fn supported(&self) -> impl Iterator<Item = (HashAlgorithm, &str)> {
        self.0
            .iter()
            .filter_map(|(name, hex)| HashAlgorithm::from_name(name).map(|alg| (alg, hex.as_str())))
    }
}

impl From<BTreeMap<String, String>> for DigestSpec {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DigestSpec {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

enum RunningDigest {
    Md5(Md5),
    Sha1(Sha1),
    Sha224(Sha224),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl RunningDigest {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Md5 => Self::Md5(Md5::new()),
            HashAlgorithm::Sha1 => Self::Sha1(Sha1::new()),
            HashAlgorithm::Sha224 => Self::Sha224(Sha224::new()),
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Sha384 => Self::Sha384(Sha384::new()),
            HashAlgorithm::Sha512 => Self::Sha512(Sha512::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(h) => h.update(data),
            Self::Sha1(h) => h.update(data),
            Self::Sha224(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha384(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Self::Md5(h) => hex::encode(h.finalize()),
            Self::Sha1(h) => hex::encode(h.finalize()),
            Self::Sha224(h) => hex::encode(h.finalize()),
            Self::Sha256(h) => hex::encode(h.finalize()),
            Self::Sha384(h) => hex::encode(h.finalize()),
            Self::Sha512(h) => hex::encode(h.finalize()),
        }
    }
}

/// One running digest per recognised algorithm of a [`DigestSpec`].
pub struct MultiHasher {
    running: Vec<(HashAlgorithm, String, RunningDigest)>,
}

impl MultiHasher {
    /// Starts digests for every recognised algorithm in `spec`.
    #[must_use]
    pub fn new(spec: &DigestSpec) -> Self {
        let running = spec
            .supported()
            .map(|(alg, expected)| (alg, expected.to_string(), RunningDigest::new(alg)))
            .collect();
        Self { running }
    }

    /// Feeds a chunk into every running digest.
    pub fn update(&mut self, data: &[u8]) {
        for (_, _, digest) in &mut self.running {
            digest.update(data);
        }
    }

    /// Finalizes and compares; the first mismatch in key order is reported.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::HashMismatch`] when a digest differs.
    pub fn finish(self) -> Result<(), DownloadError> {
        for (alg, expected, digest) in self.running {
            let actual = digest.finalize_hex();
            if actual != expected {
                return Err(DownloadError::hash_mismatch(alg.name(), actual, expected));
            }
        }
        Ok(())
    }
}

/// Failure of [`copy_verified`], split by side so callers can attach context.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// Reading the source failed.
    #[error("read failed: {0}")]
    Read(#[source] io::Error),
    /// Writing the sink failed.
    #[error("write failed: {0}")]
    Write(#[source] io::Error),
    /// The stream was fully read but a digest did not match.
    #[error(transparent)]
    Digest(DownloadError),
}

/// Copies `reader` into `sink` (if any) while hashing, then verifies.
///
/// Returns the number of bytes copied. The sink is flushed before digests
/// are compared.
///
/// # Errors
///
/// Returns [`VerifyError::Read`]/[`VerifyError::Write`] on I/O failure and
/// [`VerifyError::Digest`] wrapping [`DownloadError::HashMismatch`] when the
/// stream does not match `spec`.
pub async fn copy_verified<R, W>(
    reader: &mut R,
    spec: &DigestSpec,
    mut sink: Option<&mut W>,
) -> Result<u64, VerifyError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut hasher = MultiHasher::new(spec);
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut copied: u64 = 0;

    loop {
        let n = reader.read(&mut buf).await.map_err(VerifyError::Read)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        if let Some(sink) = sink.as_deref_mut() {
            sink.write_all(&buf[..n]).await.map_err(VerifyError::Write)?;
        }
        copied += n as u64;
    }

    if let Some(sink) = sink.as_deref_mut() {
        sink.flush().await.map_err(VerifyError::Write)?;
    }

    hasher.finish().map_err(VerifyError::Digest)?;
    Ok(copied)
}

/// Checks whether an existing file satisfies `spec`.
///
/// Returns `Ok(false)` on a digest mismatch; the bytes are discarded.
///
/// # Errors
///
/// Returns [`DownloadError::Io`] if the file cannot be opened or read.
pub async fn verify_file(path: &Path, spec: &DigestSpec) -> Result<bool, DownloadError> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| DownloadError::io(path, e))?;
    match copy_verified::<_, tokio::io::Sink>(&mut file, spec, None).await {
        Ok(bytes) => {
            debug!(path = %path.display(), bytes, "existing file matches digests");
            Ok(true)
        }
        Err(VerifyError::Digest(e)) => {
            debug!(path = %path.display(), error = %e, "existing file does not match digests");
            Ok(false)
        }
        Err(VerifyError::Read(e) | VerifyError::Write(e)) => Err(DownloadError::io(path, e)),
    }
}
