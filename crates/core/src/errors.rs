//! Error types for the mergescout core library.
//!
//! Each external collaborator has its own error type derived with `thiserror`,
//! and [`DetectorError`] wraps them per pipeline stage. The `Display` text of a
//! [`DetectorError`] is exactly the message placed in
//! [`DetectionResult::error`](crate::models::DetectionResult::error).

use thiserror::Error;

// ---------------------------------------------------------------------------
// Stage-level error
// ---------------------------------------------------------------------------

/// First failure encountered by a detection run.
#[derive(Debug, Error)]
pub enum DetectorError {
    /// A required configuration field is empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The configured local path does not exist on disk.
    #[error("Local repository path does not exist: {0}")]
    PathNotFound(String),

    /// The local path exists but is not inside a git working tree.
    #[error("Not a git repository: {0}")]
    NotARepository(String),

    /// Branch B is not among the local branches.
    #[error("Branch '{0}' does not exist locally")]
    BranchNotFound(String),

    /// A git command failed while validating the repository.
    #[error("Error validating repository: {0}")]
    RepositoryCheck(#[source] GitError),

    /// `git merge-base` failed or printed nothing.
    #[error("Failed to find merge base: {0}")]
    MergeBase(String),

    /// `git diff --name-status` failed.
    #[error("Failed to get local changes: {0}")]
    LocalChanges(#[source] GitError),

    /// The compare call against the hosting service failed.
    #[error("{}", remote_message(.0))]
    RemoteChanges(#[source] GitHubError),

    /// Anything the stages did not anticipate (e.g. a panic in a stage).
    #[error("{0}")]
    Unexpected(String),
}

fn remote_message(err: &GitHubError) -> String {
    match err {
        GitHubError::ApiError { .. } => err.to_string(),
        other => format!("Failed to get remote changes: {}", other),
    }
}

// ---------------------------------------------------------------------------
// Git errors
// ---------------------------------------------------------------------------

/// Errors from running the `git` command-line tool.
#[derive(Debug, Error)]
pub enum GitError {
    /// The `git` binary was not found on `$PATH`.
    #[error("git binary not found: {0}")]
    BinaryNotFound(String),

    /// A `git` command exited with a non-zero status.
    #[error("git command failed (exit {exit_code}): {stderr}")]
    CommandFailed { exit_code: i32, stderr: String },

    /// A `git` command did not finish within the configured deadline.
    #[error("git {command} timed out after {secs}s")]
    TimedOut { command: String, secs: u64 },

    /// Generic I/O wrapper.
    #[error("git I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// GitHub API errors
// ---------------------------------------------------------------------------

/// Errors from GitHub REST API interactions.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// The API answered with a non-success status code.
    #[error("GitHub API error ({}): {message}", status_label(.status))]
    ApiError {
        status: Option<u16>,
        message: String,
    },

    /// HTTP-level transport error (network, TLS, timeout, etc.).
    #[error("GitHub HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON deserialization failure.
    #[error("GitHub response parse error: {0}")]
    ParseError(String),

    /// The configured API URL cannot be used as a base for request paths.
    #[error("invalid GitHub API URL: {0}")]
    InvalidUrl(String),
}

/// Render an API status code, or `Unknown` when the service did not give one.
pub fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "Unknown".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from loading and validating [`DetectorSettings`](crate::config::DetectorSettings).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
