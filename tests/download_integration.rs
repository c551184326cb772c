//! Integration tests for the download module.
//!
//! These tests drive `HttpClient::acquire` and the atomic installer against
//! mock HTTP servers and real temp directories.

mod support;

use std::path::PathBuf;

use installer_core::download::{self, DigestSpec, DownloadError, DownloadTarget, HttpClient};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

use support::{digests_of, leftover_temps, serve_file, serve_status};

#[tokio::test]
async fn test_acquire_twice_second_call_makes_no_request() {
    let server = MockServer::start().await;
    let body = b"fabric-server-launch.jar contents";
    // Exactly one request across both calls.
    serve_file(&server, "/server.jar", body, 1).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let dest = temp_dir.path().join("server.jar");
    let target = DownloadTarget::new(format!("{}/server.jar", server.uri()), &dest)
        .with_expected_size(body.len() as u64)
        .with_digests(digests_of(body));
    let client = HttpClient::new();
    let cancel = CancellationToken::new();

    let first = client.acquire(&target, None, &cancel).await.expect("first acquire");
    let second = client.acquire(&target, None, &cancel).await.expect("second acquire");

    assert_eq!(first, dest);
    assert_eq!(second, dest);
    assert_eq!(std::fs::read(&dest).expect("read dest"), body);
}

#[tokio::test]
async fn test_install_never_clobbers_existing_destination() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let temp = temp_dir.path().join("incoming.tmp");
    let dest = temp_dir.path().join("eula.txt");
    std::fs::write(&temp, b"eula=true").expect("write temp");
    std::fs::write(&dest, b"eula=false").expect("write dest");

    let result = download::install(&temp, &dest, None).await;

    assert!(
        matches!(result, Err(DownloadError::AlreadyExists { ref path }) if *path == dest),
        "got {result:?}"
    );
    assert_eq!(std::fs::read(&dest).expect("read dest"), b"eula=false");
}

#[tokio::test]
async fn test_wrong_digest_leaves_no_destination() {
    let server = MockServer::start().await;
    let body = b"mod jar bytes";
    serve_file(&server, "/mod.jar", body, 1).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let dest = temp_dir.path().join("mods/mod.jar");
    let mut digests = digests_of(body);
    digests = digests.with("sha512", "0".repeat(128));
    let target = DownloadTarget::new(format!("{}/mod.jar", server.uri()), &dest).with_digests(digests);

    let result = HttpClient::new()
        .acquire(&target, None, &CancellationToken::new())
        .await;

    match result {
        Err(DownloadError::HashMismatch {
            algorithm, expected, ..
        }) => {
            assert_eq!(algorithm, "sha512");
            assert_eq!(expected, "0".repeat(128));
        }
        other => panic!("Expected HashMismatch, got: {other:?}"),
    }
    assert!(!dest.exists(), "no file may exist at the destination");
    assert!(leftover_temps(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_mirror_fallback_after_404_cleans_up() {
    let server = MockServer::start().await;
    let body = b"served by the second mirror";
    serve_status(&server, "/bad/lib.jar", 404).await;
    serve_file(&server, "/good/lib.jar", body, 1).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let dest = temp_dir.path().join("libraries/lib.jar");
    let target = DownloadTarget::from_mirrors(
        vec![
            format!("{}/bad/lib.jar", server.uri()),
            format!("{}/good/lib.jar", server.uri()),
        ],
        &dest,
    )
    .with_digests(digests_of(body));

    let path = HttpClient::new()
        .acquire(&target, None, &CancellationToken::new())
        .await
        .expect("second mirror should succeed");

    assert_eq!(path, dest);
    assert_eq!(std::fs::read(&dest).expect("read dest"), body);
    assert!(leftover_temps(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_mirror_with_bad_bytes_falls_back_to_next() {
    let server = MockServer::start().await;
    let good = b"the real artifact";
    serve_file(&server, "/tampered", b"something else entirely", 1).await;
    serve_file(&server, "/origin", good, 1).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let dest = temp_dir.path().join("artifact.bin");
    let target = DownloadTarget::new(format!("{}/tampered", server.uri()), &dest)
        .with_mirror(format!("{}/origin", server.uri()))
        .with_digests(digests_of(good));

    HttpClient::new()
        .acquire(&target, None, &CancellationToken::new())
        .await
        .expect("origin should satisfy the digests");

    assert_eq!(std::fs::read(&dest).expect("read dest"), good);
    assert!(leftover_temps(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_existing_invalid_destination_is_refused_not_replaced() {
    let server = MockServer::start().await;
    let body = b"fresh";
    serve_file(&server, "/a", body, 1).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let dest = temp_dir.path().join("a");
    std::fs::write(&dest, b"stale").expect("write stale");
    let target = DownloadTarget::new(format!("{}/a", server.uri()), &dest)
        .with_mirror(format!("{}/never", server.uri()))
        .with_digests(digests_of(body));

    let result = HttpClient::new()
        .acquire(&target, None, &CancellationToken::new())
        .await;

    // AlreadyExists stops the mirror loop; the second mirror is never tried.
    assert!(matches!(result, Err(DownloadError::AlreadyExists { .. })));
    assert_eq!(std::fs::read(&dest).expect("read dest"), b"stale");
    assert!(leftover_temps(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_concurrent_acquires_to_distinct_destinations() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let client = HttpClient::new();
    let mut targets = Vec::new();
    for i in 0..12 {
        let body = format!("artifact number {i}").into_bytes();
        serve_file(&server, &format!("/a{i}"), &body, 1).await;
        let dest = temp_dir.path().join(format!("out/a{i}.bin"));
        targets.push((
            DownloadTarget::new(format!("{}/a{i}", server.uri()), dest).with_digests(digests_of(&body)),
            body,
        ));
    }

    let mut handles = Vec::new();
    for (target, _) in &targets {
        let client = client.clone();
        let target = target.clone();
        handles.push(tokio::spawn(async move {
            client.acquire(&target, None, &CancellationToken::new()).await
        }));
    }
    let mut installed: Vec<PathBuf> = Vec::new();
    for handle in handles {
        installed.push(handle.await.expect("task").expect("acquire"));
    }

    for ((target, body), path) in targets.iter().zip(&installed) {
        assert_eq!(path, target.dest());
        assert_eq!(&std::fs::read(path).expect("read"), body);
    }
    assert!(leftover_temps(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_unknown_algorithms_do_not_enable_skip() {
    let server = MockServer::start().await;
    let body = b"bytes";
    serve_file(&server, "/f", body, 1).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let dest = temp_dir.path().join("f");
    let target = DownloadTarget::new(format!("{}/f", server.uri()), &dest)
        .with_digests(DigestSpec::new().with("murmur2", "1234"));

    // Nothing verifiable, so the mirror is fetched and the file installed.
    HttpClient::new()
        .acquire(&target, None, &CancellationToken::new())
        .await
        .expect("acquire");
    assert_eq!(std::fs::read(&dest).expect("read"), body);
}
