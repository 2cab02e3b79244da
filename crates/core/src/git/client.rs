//! Local Git repository queries via the `git` CLI.
//!
//! Every invocation goes through a [`GitRunner`], so the detector can be
//! driven by a fake in tests. [`GitCli`] is the real runner: an async child
//! process bounded by a deadline and killed if the deadline passes.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, instrument};

use super::parser::{parse_branch_list, parse_name_status};
use crate::config::GitSettings;
use crate::errors::GitError;
use crate::models::ChangeEntry;

/// Runs a git command in a working directory and returns its stdout.
pub trait GitRunner: Send + Sync {
    fn run(
        &self,
        dir: &Path,
        args: &[&str],
    ) -> impl Future<Output = Result<String, GitError>> + Send;
}

/// [`GitRunner`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    binary: String,
    timeout: Duration,
}

impl GitCli {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn from_settings(settings: &GitSettings) -> Self {
        Self::new(settings.binary.clone(), settings.timeout())
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::from_settings(&GitSettings::default())
    }
}

impl GitRunner for GitCli {
    async fn run(&self, dir: &Path, args: &[&str]) -> Result<String, GitError> {
        let mut cmd = Command::new(&self.binary);
        cmd.current_dir(dir)
            .args(args)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(cmd = ?format!("git {}", args.join(" ")), dir = %dir.display(), "running git command");
        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    GitError::BinaryNotFound(self.binary.clone())
                } else {
                    GitError::IoError(e)
                }
            })?,
            Err(_) => {
                let command = args.first().copied().unwrap_or_default().to_string();
                debug!(%command, secs = self.timeout.as_secs(), "git command timed out");
                return Err(GitError::TimedOut {
                    command,
                    secs: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let exit_code = output.status.code().unwrap_or(-1);
            debug!(exit_code, %stderr, "git command failed");
            return Err(GitError::CommandFailed { exit_code, stderr });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Read-only queries against one local repository.
#[derive(Debug, Clone)]
pub struct GitClient<R> {
    runner: R,
    repo_path: PathBuf,
}

impl<R: GitRunner> GitClient<R> {
    pub fn new(runner: R, repo_path: impl Into<PathBuf>) -> Self {
        let repo_path = repo_path.into();
        info!(path = %repo_path.display(), "created GitClient");
        Self { runner, repo_path }
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Whether the repository path lies inside a git working tree.
    ///
    /// git's "not a git repository" failure is reported as `Ok(false)`.
    #[instrument(skip(self), fields(path = %self.repo_path.display()))]
    pub async fn is_inside_work_tree(&self) -> Result<bool, GitError> {
        match self
            .runner
            .run(&self.repo_path, &["rev-parse", "--is-inside-work-tree"])
            .await
        {
            Ok(output) => Ok(output.trim() == "true"),
            Err(GitError::CommandFailed { ref stderr, .. })
                if stderr.contains("not a git repository") =>
            {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// List all local branch names.
    #[instrument(skip(self), fields(path = %self.repo_path.display()))]
    pub async fn list_branches(&self) -> Result<Vec<String>, GitError> {
        let output = self.runner.run(&self.repo_path, &["branch", "--list"]).await?;
        let branches = parse_branch_list(&output);
        debug!(count = branches.len(), "listed local branches");
        Ok(branches)
    }

    /// Raw merge-base of two refs, trimmed. May be empty.
    #[instrument(skip(self), fields(path = %self.repo_path.display()))]
    pub async fn merge_base(&self, left: &str, right: &str) -> Result<String, GitError> {
        let output = self
            .runner
            .run(&self.repo_path, &["merge-base", left, right])
            .await?;
        Ok(output.trim().to_string())
    }

    /// Paths changed between `base` and `branch`, as `git diff --name-status` reports them.
    #[instrument(skip(self), fields(path = %self.repo_path.display()))]
    pub async fn diff_name_status(
        &self,
        base: &str,
        branch: &str,
    ) -> Result<Vec<ChangeEntry>, GitError> {
        let output = self
            .runner
            .run(&self.repo_path, &["diff", "--name-status", base, branch])
            .await?;
        Ok(parse_name_status(&output))
    }
}
