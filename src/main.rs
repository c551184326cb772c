//! CLI entry point for the modpack installer.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use installer_core::download::{ClientConfig, DownloadTarget, HttpClient};
use installer_core::pack::{BatchInstaller, BatchOptions, PackArchive, Role, download_name};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

mod cli;
mod progress_ui;

use cli::Args;
use progress_ui::ProgressUi;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping downloads");
            interrupt.cancel();
        }
    });

    let client = HttpClient::with_config(&ClientConfig {
        timeout: Duration::from_secs(args.timeout),
        ..ClientConfig::default()
    })
    .context("failed to build HTTP client")?;
    let ui = ProgressUi::new(progress_ui::should_draw(args.quiet));

    // A downloaded pack lives in a temp dir removed on exit.
    let (pack_path, _download_dir) = match Url::parse(&args.pack) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            let dir = tempfile::tempdir().context("failed to create temp directory")?;
            let path = fetch_pack(&client, &url, dir.path(), &ui, &cancel).await?;
            (path, Some(dir))
        }
        _ => (PathBuf::from(&args.pack), None),
    };

    info!(path = %pack_path.display(), "loading modpack");
    let loading = pack_path.clone();
    let pack = tokio::task::spawn_blocking(move || PackArchive::open(&loading))
        .await?
        .with_context(|| format!("couldn't load modpack {}", pack_path.display()))?;

    let role = if args.client { Role::Client } else { Role::Server };
    let options = BatchOptions::new(role).with_concurrency(usize::from(args.concurrency));
    let installer =
        BatchInstaller::new(client, options)?.with_entry_progress(ui.entry_progress());

    tokio::fs::create_dir_all(&args.output)
        .await
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    let include_optional = !args.skip_optional;
    let report = pack
        .install(&installer, &args.output, |_| include_optional, &cancel)
        .await
        .context("install modpack error")?;

    for warning in &report.warnings {
        warn!("{warning}");
    }
    info!(
        installed = report.installed.len(),
        skipped = report.skipped.len(),
        warnings = report.warnings.len(),
        overlay_files = report.overlay_files,
        output = %args.output.display(),
        "modpack installed"
    );

    let dependencies = &pack.index().dependencies;
    if dependencies.is_empty() {
        warn!("modpack didn't declare any dependencies");
    } else {
        // Loader installation is left to the user.
        println!("Modpack requires:");
        for (name, version) in dependencies {
            println!("  {name} {version}");
        }
    }

    Ok(())
}

/// Downloads the pack at `url` into `dir`.
async fn fetch_pack(
    client: &HttpClient,
    url: &Url,
    dir: &Path,
    ui: &ProgressUi,
    cancel: &CancellationToken,
) -> Result<PathBuf> {
    info!(url = %url, "downloading modpack");
    let target = DownloadTarget::new(url.as_str(), download_name(url, dir));
    let path = client
        .download(url.as_str(), &target, Some(ui.observer("modpack")), cancel)
        .await
        .with_context(|| format!("couldn't download modpack {url}"))?;
    Ok(path)
}
