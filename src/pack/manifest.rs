//! Pack index model (`modrinth.index.json`).

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::download::{DigestSpec, DownloadTarget};

/// Side of the game an install is for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Role {
    Client,
    #[default]
    Server,
}

impl Role {
    /// Key used in an entry's `env` map.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Server => "server",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an entry relates to one role.
///
/// Any value other than `optional` or `unsupported` counts as required.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum EnvSupport {
    #[default]
    Required,
    Optional,
    Unsupported,
}

impl From<String> for EnvSupport {
    fn from(value: String) -> Self {
        match value.as_str() {
            "optional" => Self::Optional,
            "unsupported" => Self::Unsupported,
            _ => Self::Required,
        }
    }
}

impl From<EnvSupport> for &'static str {
    fn from(value: EnvSupport) -> Self {
        match value {
            EnvSupport::Required => "required",
            EnvSupport::Optional => "optional",
            EnvSupport::Unsupported => "unsupported",
        }
    }
}

/// One downloadable file of a pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Destination relative to the install root, `/`-separated.
    pub path: String,
    #[serde(default)]
    pub hashes: DigestSpec,
    /// Per-role support; absent means required everywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, EnvSupport>>,
    #[serde(default)]
    pub downloads: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

impl ManifestEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            hashes: DigestSpec::new(),
            env: None,
            downloads: Vec::new(),
            file_size: None,
        }
    }

    #[must_use]
    pub fn with_download(mut self, url: impl Into<String>) -> Self {
        self.downloads.push(url.into());
        self
    }

    #[must_use]
    pub fn with_hashes(mut self, hashes: DigestSpec) -> Self {
        self.hashes = hashes;
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.file_size = Some(size);
        self
    }

    #[must_use]
    pub fn with_env(mut self, role: Role, support: EnvSupport) -> Self {
        self.env
            .get_or_insert_with(BTreeMap::new)
            .insert(role.as_str().to_string(), support);
        self
    }

    /// Classification of this entry for `role`.
    #[must_use]
    pub fn support_for(&self, role: Role) -> EnvSupport {
        self.env
            .as_ref()
            .and_then(|env| env.get(role.as_str()))
            .copied()
            .unwrap_or_default()
    }

    /// Download target writing to `dest`.
    #[must_use]
    pub fn to_target(&self, dest: PathBuf) -> DownloadTarget {
        let target =
            DownloadTarget::from_mirrors(self.downloads.clone(), dest).with_digests(self.hashes.clone());
        match self.file_size {
            Some(size) => target.with_expected_size(size),
            None => target,
        }
    }
}

/// Parsed `modrinth.index.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackIndex {
    pub format_version: u32,
    pub game: String,
    pub version_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub files: Vec<ManifestEntry>,
    /// Loader and game versions the pack was built against.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}
