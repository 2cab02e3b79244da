//! mergescout command-line tool.
//!
//! Compares a local branch against a branch on GitHub and lists the files
//! changed on both sides since their merge-base, without fetching or merging
//! anything.

mod output;
mod style;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mergescout_core::{detect_conflicts, DetectorConfig, DetectorSettings};

use output::OutputFormat;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Flag files changed on both sides of two divergent branches.
#[derive(Parser, Debug)]
#[command(
    name = "mergescout",
    version,
    about = "Flag files changed on both a GitHub branch and a local branch since their merge-base"
)]
struct Cli {
    /// Repository owner on GitHub (required).
    #[arg(long)]
    owner: Option<String>,

    /// Repository name on GitHub (required).
    #[arg(long)]
    repo: Option<String>,

    /// GitHub access token. Falls back to --token-file, then $GITHUB_TOKEN.
    #[arg(long, conflicts_with = "token_file")]
    token: Option<String>,

    /// File containing the GitHub access token.
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// Path to the local repository.
    #[arg(long, default_value = ".")]
    path: PathBuf,

    /// Reference branch, read from GitHub (compared as origin/<branch-a> locally).
    #[arg(long)]
    branch_a: Option<String>,

    /// Local branch (required).
    #[arg(long)]
    branch_b: Option<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Write the report to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Optional TOML settings file (API URL, git binary, timeouts).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr.
    #[arg(short, long)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    // Usage errors exit 1 like every other failure; --help and --version exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}", style::error(&format!("Error: {:#}", e)));
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when detection itself reported an error.
async fn run(cli: Cli) -> Result<bool> {
    let settings = load_settings(cli.config.as_deref())?;
    let token = resolve_token(cli.token.as_deref(), cli.token_file.as_deref(), &settings)?;

    let config = detector_config(&cli, token);
    debug!(owner = %config.owner, repo = %config.repo, "running detection");

    let result = detect_conflicts(config, &settings).await;

    let styled = cli.output.is_none() && std::io::stdout().is_terminal();
    output::report(
        &result,
        cli.format,
        cli.output.as_deref(),
        styled,
        &mut std::io::stdout(),
    )
}

/// Missing flags become empty fields so the detector reports them in its
/// fixed validation order.
fn detector_config(cli: &Cli, token: String) -> DetectorConfig {
    let field = |value: &Option<String>| value.clone().unwrap_or_default();
    DetectorConfig {
        owner: field(&cli.owner),
        repo: field(&cli.repo),
        token,
        local_path: cli.path.clone(),
        branch_a: field(&cli.branch_a),
        branch_b: field(&cli.branch_b),
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn load_settings(path: Option<&Path>) -> Result<DetectorSettings> {
    match path {
        Some(path) => {
            DetectorSettings::load_and_validate(path).context("failed to load settings file")
        }
        None => Ok(DetectorSettings::default()),
    }
}

/// Pick the token from `--token`, then `--token-file`, then the environment.
///
/// A missing token is returned as an empty string so that the detector's own
/// validation reports it.
fn resolve_token(
    token: Option<&str>,
    token_file: Option<&Path>,
    settings: &DetectorSettings,
) -> Result<String> {
    if let Some(token) = token {
        return Ok(token.to_string());
    }
    if let Some(path) = token_file {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read token file {}", path.display()))?;
        return Ok(contents.trim_end().to_string());
    }
    Ok(settings.resolve_token().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from([
            "mergescout",
            "--owner",
            "acme",
            "--repo",
            "widgets",
            "--branch-a",
            "main",
            "--branch-b",
            "feature",
        ])
        .unwrap();
        assert_eq!(cli.path, PathBuf::from("."));
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(cli.token.is_none());
        assert!(cli.output.is_none());
    }

    #[test]
    fn test_missing_flags_reach_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap();
        let cli = Cli::try_parse_from([
            "mergescout",
            "--repo",
            "widgets",
            "--branch-a",
            "main",
            "--branch-b",
            "feature",
            "--path",
            path,
        ])
        .unwrap();
        let config = detector_config(&cli, "ghp_test".into());
        assert_eq!(config.owner, "");
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "Repository owner is required"
        );

        let cli = Cli::try_parse_from(["mergescout", "--path", path]).unwrap();
        let config = detector_config(&cli, String::new());
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "Repository owner is required"
        );
    }

    #[test]
    fn test_usage_errors_go_to_stderr() {
        let err = Cli::try_parse_from(["mergescout", "--bogus"]).unwrap_err();
        assert!(err.use_stderr());

        let err = Cli::try_parse_from(["mergescout", "--help"]).unwrap_err();
        assert!(!err.use_stderr());
        let err = Cli::try_parse_from(["mergescout", "--version"]).unwrap_err();
        assert!(!err.use_stderr());
    }

    #[test]
    fn test_token_and_token_file_conflict() {
        let result = Cli::try_parse_from([
            "mergescout",
            "--owner",
            "acme",
            "--repo",
            "widgets",
            "--branch-a",
            "main",
            "--branch-b",
            "feature",
            "--token",
            "a",
            "--token-file",
            "t.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_token_file_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "ghp_secret \n\n").unwrap();
        let token = resolve_token(None, Some(&path), &DetectorSettings::default()).unwrap();
        assert_eq!(token, "ghp_secret");
    }

    #[test]
    fn test_explicit_token_wins() {
        let token = resolve_token(Some("ghp_direct"), None, &DetectorSettings::default()).unwrap();
        assert_eq!(token, "ghp_direct");
    }

    #[test]
    fn test_missing_token_file_is_error() {
        let result = resolve_token(
            None,
            Some(Path::new("/nonexistent/token")),
            &DetectorSettings::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_token_from_environment() {
        let mut settings = DetectorSettings::default();
        settings.github.token_env = "MERGESCOUT_CLI_TEST_TOKEN".into();
        std::env::set_var("MERGESCOUT_CLI_TEST_TOKEN", "ghp_env");
        assert_eq!(resolve_token(None, None, &settings).unwrap(), "ghp_env");
        std::env::remove_var("MERGESCOUT_CLI_TEST_TOKEN");
        assert_eq!(resolve_token(None, None, &settings).unwrap(), "");
    }
}
