//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use installer_core::download::constants::REQUEST_TIMEOUT_SECS;
use installer_core::pack::DEFAULT_CONCURRENCY;

/// Install a Minecraft modpack (.mrpack) into a server or client directory.
///
/// Every file listed by the pack is downloaded from its mirrors, checked
/// against the pack's hashes and moved into place atomically; the pack's
/// override trees are copied over the result afterwards.
#[derive(Parser, Debug)]
#[command(name = "server-installer")]
#[command(author, version, about)]
pub struct Args {
    /// Modpack file path or http(s) URL; a URL is downloaded first
    pub pack: String,

    /// Directory to install into
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Install the client side of the pack instead of the server side
    #[arg(long)]
    pub client: bool,

    /// Do not install files the pack marks as optional
    #[arg(long)]
    pub skip_optional: bool,

    /// Maximum concurrent downloads (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Per-request timeout in seconds (1-3600)
    #[arg(short = 't', long, default_value_t = REQUEST_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: u64,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["server-installer", "pack.mrpack"]).unwrap();
        assert_eq!(args.pack, "pack.mrpack");
        assert_eq!(args.output, PathBuf::from("."));
        assert!(!args.client);
        assert!(!args.skip_optional);
        assert_eq!(args.concurrency, 8); // DEFAULT_CONCURRENCY
        assert_eq!(args.timeout, 10); // REQUEST_TIMEOUT_SECS
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_pack_argument_required() {
        let result = Args::try_parse_from(["server-installer"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["server-installer", "p", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["server-installer", "p", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["server-installer", "p", "--quiet"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_role_and_optional_flags() {
        let args = Args::try_parse_from([
            "server-installer",
            "https://cdn.example.com/pack.mrpack",
            "--client",
            "--skip-optional",
            "-o",
            "/srv/mc",
        ])
        .unwrap();
        assert!(args.client);
        assert!(args.skip_optional);
        assert_eq!(args.output, PathBuf::from("/srv/mc"));
    }

    #[test]
    fn test_cli_concurrency_bounds() {
        let args = Args::try_parse_from(["server-installer", "p", "-c", "100"]).unwrap();
        assert_eq!(args.concurrency, 100);

        for bad in ["0", "101"] {
            let err = Args::try_parse_from(["server-installer", "p", "-c", bad]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        }
    }

    #[test]
    fn test_cli_timeout_zero_rejected() {
        let err = Args::try_parse_from(["server-installer", "p", "--timeout", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["server-installer", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
