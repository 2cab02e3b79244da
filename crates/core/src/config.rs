//! Run configuration for mergescout.
//!
//! A [`DetectorConfig`] describes one comparison (which repository, which
//! branches, which credential). [`DetectorSettings`] holds the environment
//! knobs (API host, git binary, timeouts) and can be loaded from a TOML file.
//! Secrets are never stored in the settings file; the token is referenced by
//! environment variable name and resolved with [`DetectorSettings::resolve_token`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{ConfigError, DetectorError};

// ---------------------------------------------------------------------------
// Per-run config
// ---------------------------------------------------------------------------

/// Inputs for a single detection run. All fields are mandatory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Repository owner (user or organisation) on the hosting service.
    pub owner: String,
    /// Repository name on the hosting service.
    pub repo: String,
    /// API access token.
    pub token: String,
    /// Path to the local working copy.
    pub local_path: PathBuf,
    /// Reference branch, read through the hosting API.
    pub branch_a: String,
    /// Local branch, read through the `git` CLI.
    pub branch_b: String,
}

impl DetectorConfig {
    /// Check required fields in fixed order, then that the local path exists.
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), DetectorError> {
        let required: [(&'static str, bool); 6] = [
            ("Repository owner", self.owner.is_empty()),
            ("Repository name", self.repo.is_empty()),
            ("GitHub token", self.token.is_empty()),
            ("Local repository path", self.local_path.as_os_str().is_empty()),
            ("Branch A name", self.branch_a.is_empty()),
            ("Branch B name", self.branch_b.is_empty()),
        ];
        if let Some((field, _)) = required.iter().find(|(_, missing)| *missing) {
            return Err(DetectorError::MissingField(*field));
        }

        if !self.local_path.exists() {
            return Err(DetectorError::PathNotFound(
                self.local_path.display().to_string(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Environment-level settings, loadable from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectorSettings {
    /// GitHub API settings.
    #[serde(default)]
    pub github: GitHubSettings,

    /// Local git CLI settings.
    #[serde(default)]
    pub git: GitSettings,
}

/// GitHub API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubSettings {
    /// GitHub API base URL (default `https://api.github.com`).
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Environment variable consulted when no token is given explicitly.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

fn default_github_api_url() -> String {
    "https://api.github.com".into()
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".into()
}
fn default_http_timeout() -> u64 {
    30
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            token_env: default_token_env(),
            timeout_secs: default_http_timeout(),
        }
    }
}

/// Local git CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitSettings {
    /// Name or path of the git executable.
    #[serde(default = "default_git_binary")]
    pub binary: String,

    /// Remote alias that prefixes branch A (`<remote>/<branch_a>`).
    #[serde(default = "default_remote_name")]
    pub remote_name: String,

    /// Deadline for each git invocation, in seconds.
    #[serde(default = "default_git_timeout")]
    pub timeout_secs: u64,
}

fn default_git_binary() -> String {
    "git".into()
}
fn default_remote_name() -> String {
    "origin".into()
}
fn default_git_timeout() -> u64 {
    60
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            binary: default_git_binary(),
            remote_name: default_remote_name(),
            timeout_secs: default_git_timeout(),
        }
    }
}

impl GitSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl GitHubSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl DetectorSettings {
    /// Load settings from a TOML file at the given path.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading settings");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let settings: DetectorSettings =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("settings parsed successfully");
        Ok(settings)
    }

    /// Convenience: load and validate in one call.
    pub fn load_and_validate<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Self::load_from_file(path)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate that all values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.github.api_url.trim().is_empty() {
            return Err(invalid("github.api_url", "API URL must not be empty"));
        }
        if self.github.timeout_secs == 0 {
            return Err(invalid("github.timeout_secs", "timeout must be > 0"));
        }
        if self.git.binary.trim().is_empty() {
            return Err(invalid("git.binary", "git binary must not be empty"));
        }
        if self.git.remote_name.trim().is_empty() {
            return Err(invalid("git.remote_name", "remote name must not be empty"));
        }
        if self.git.timeout_secs == 0 {
            return Err(invalid("git.timeout_secs", "timeout must be > 0"));
        }
        Ok(())
    }

    /// Read the token from the environment variable named by `github.token_env`.
    pub fn resolve_token(&self) -> Option<String> {
        let env_name = &self.github.token_env;
        match std::env::var(env_name) {
            Ok(val) if !val.trim().is_empty() => {
                debug!(env_name = %env_name, "resolved token from environment");
                Some(val.trim().to_string())
            }
            Ok(_) => {
                debug!(env_name = %env_name, "token env var is set but empty");
                None
            }
            Err(_) => {
                debug!(env_name = %env_name, "token env var not set");
                None
            }
        }
    }
}

fn invalid(field: &str, detail: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        detail: detail.into(),
    }
}
