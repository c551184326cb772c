//! Modpack archives: a zip holding `modrinth.index.json` plus override trees.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use zip::ZipArchive;
use zip::result::ZipError;

use super::batch::{BatchInstaller, InstallReport};
use super::error::InstallError;
use super::manifest::{ManifestEntry, PackIndex, Role};
use super::overlay::Overlay;

/// Name of the index file at the archive root.
pub const INDEX_FILE: &str = "modrinth.index.json";

/// Index format versions this build understands.
pub const SUPPORTED_FORMAT_VERSIONS: &[u32] = &[1];

/// The only game packs may target.
pub const SUPPORTED_GAME: &str = "minecraft";

const OVERRIDES: &str = "overrides/";
const CLIENT_OVERRIDES: &str = "client-overrides/";
const SERVER_OVERRIDES: &str = "server-overrides/";

/// A fully loaded pack: index plus override trees, with the archive closed.
#[derive(Debug, Clone)]
pub struct PackArchive {
    index: PackIndex,
    overrides: Overlay,
    client_overrides: Overlay,
    server_overrides: Overlay,
}

impl PackArchive {
    /// Reads the pack at `path`. Blocking; call from `spawn_blocking` in
    /// async contexts.
    ///
    /// # Errors
    ///
    /// See [`PackArchive::from_reader`]; opening the file maps to
    /// [`InstallError::Io`].
    pub fn open(path: &Path) -> Result<Self, InstallError> {
        let file = File::open(path).map_err(|e| InstallError::io(path, e))?;
        Self::from_reader(BufReader::new(file))
    }

    /// Reads a pack from any seekable source.
    ///
    /// # Errors
    ///
    /// - [`InstallError::Archive`] if the zip is unreadable.
    /// - [`InstallError::MissingIndex`] if there is no index file.
    /// - [`InstallError::Index`] if the index does not parse.
    /// - [`InstallError::UnsupportedFormat`] for a format version other than 1.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, InstallError> {
        let mut archive = ZipArchive::new(reader)?;
        let index = read_index(&mut archive)?;

        let mut pack = Self {
            index,
            overrides: Overlay::new(),
            client_overrides: Overlay::new(),
            server_overrides: Overlay::new(),
        };
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();
            let (target, relative) = if let Some(rest) = name.strip_prefix(OVERRIDES) {
                (&mut pack.overrides, rest)
            } else if let Some(rest) = name.strip_prefix(CLIENT_OVERRIDES) {
                (&mut pack.client_overrides, rest)
            } else if let Some(rest) = name.strip_prefix(SERVER_OVERRIDES) {
                (&mut pack.server_overrides, rest)
            } else {
                continue;
            };
            let relative = relative.trim_end_matches('/');
            if relative.is_empty() {
                continue;
            }

            if file.is_dir() {
                target.push_dir(relative, file.unix_mode());
            } else {
                let mut contents = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
                file.read_to_end(&mut contents)
                    .map_err(|e| InstallError::Archive(ZipError::Io(e)))?;
                target.push_file(relative, contents, file.unix_mode());
            }
        }

        debug!(
            files = pack.index.files.len(),
            overrides = pack.overrides.len(),
            client_overrides = pack.client_overrides.len(),
            server_overrides = pack.server_overrides.len(),
            "pack loaded"
        );
        Ok(pack)
    }

    #[must_use]
    pub fn index(&self) -> &PackIndex {
        &self.index
    }

    #[must_use]
    pub fn files(&self) -> &[ManifestEntry] {
        &self.index.files
    }

    /// Overlay for `role`: shared overrides first, then the role's own.
    #[must_use]
    pub fn overlay_for(&self, role: Role) -> Overlay {
        let mut overlay = self.overrides.clone();
        overlay.extend(match role {
            Role::Client => &self.client_overrides,
            Role::Server => &self.server_overrides,
        });
        overlay
    }

    /// Installs the pack for the installer's role under `root`.
    ///
    /// # Errors
    ///
    /// [`InstallError::UnsupportedGame`] unless the pack targets Minecraft,
    /// then anything [`BatchInstaller::install_batch`] returns.
    #[instrument(skip(self, installer, include_optional, cancel), fields(pack = %self.index.name, root = %root.display()))]
    pub async fn install<P>(
        &self,
        installer: &BatchInstaller,
        root: &Path,
        include_optional: P,
        cancel: &CancellationToken,
    ) -> Result<InstallReport, InstallError>
    where
        P: Fn(&ManifestEntry) -> bool,
    {
        let role = installer.options().role;
        info!(
            game = %self.index.game,
            name = %self.index.name,
            version = %self.index.version_id,
            %role,
            "installing modpack"
        );
        if let Some(summary) = self.index.summary.as_deref().filter(|s| !s.is_empty()) {
            info!(summary, "pack summary");
        }
        if self.index.game != SUPPORTED_GAME {
            return Err(InstallError::UnsupportedGame {
                game: self.index.game.clone(),
            });
        }

        installer
            .install_batch(
                &self.index.files,
                include_optional,
                root,
                &self.overlay_for(role),
                cancel,
            )
            .await
    }
}

fn read_index<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<PackIndex, InstallError> {
    let file = match archive.by_name(INDEX_FILE) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Err(InstallError::MissingIndex),
        Err(e) => return Err(e.into()),
    };
    let index: PackIndex = serde_json::from_reader(file)?;
    if !SUPPORTED_FORMAT_VERSIONS.contains(&index.format_version) {
        return Err(InstallError::UnsupportedFormat {
            version: index.format_version,
            supported: SUPPORTED_FORMAT_VERSIONS,
        });
    }
    Ok(index)
}

/// File name to store a downloaded pack under `dir`, taken from the URL path.
#[must_use]
pub fn download_name(url: &url::Url, dir: &Path) -> PathBuf {
    let name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("pack.mrpack");
    dir.join(name)
}
