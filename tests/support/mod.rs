//! Shared helpers for integration tests: mock mirrors, digests, temp-file scans.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use installer_core::download::{DigestSpec, HashAlgorithm};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::SimpleFileOptions;

/// Suffix of the installer's private temp files.
pub const TEMP_SUFFIX: &str = ".downloading";

/// sha1 + sha512 digests of `bytes`, the pair packs usually carry.
pub fn digests_of(bytes: &[u8]) -> DigestSpec {
    DigestSpec::new()
        .with("sha1", HashAlgorithm::Sha1.hex_digest(bytes))
        .with("sha512", HashAlgorithm::Sha512.hex_digest(bytes))
}

/// Serves `body` at `route`, expecting exactly `hits` requests.
pub async fn serve_file(server: &MockServer, route: &str, body: &[u8], hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .expect(hits)
        .mount(server)
        .await;
}

/// Answers `route` with `status` and no body.
pub async fn serve_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Every leftover temp file anywhere under `root`.
pub fn leftover_temps(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.to_string_lossy().ends_with(TEMP_SUFFIX) {
                found.push(path);
            }
        }
    }
    found
}

/// Builds an in-memory `.mrpack` with the given index and `(name, contents, mode)` entries.
pub fn build_pack(index: &str, entries: &[(&str, &[u8], u32)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    writer
        .start_file("modrinth.index.json", stored)
        .expect("start index");
    writer.write_all(index.as_bytes()).expect("write index");
    for (name, contents, mode) in entries {
        writer
            .start_file(*name, stored.unix_permissions(*mode))
            .expect("start entry");
        writer.write_all(contents).expect("write entry");
    }
    writer.finish().expect("finish pack").into_inner()
}
