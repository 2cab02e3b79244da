//! Potential-conflict detection.
//!
//! A run validates the inputs and the local repository, resolves the
//! merge-base of `<remote>/<branch_a>` and `branch_b`, collects the changes on
//! each side relative to that merge-base (locally through `git`, remotely
//! through the GitHub compare API) and reports the paths present in both.
//!
//! A file changed on both sides may still merge cleanly; the result is a
//! risk signal, not a merge.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, info, instrument};

use crate::config::{DetectorConfig, DetectorSettings};
use crate::errors::{DetectorError, GitError};
use crate::git::{GitCli, GitClient, GitHubClient, GitRunner, RemoteChangeSource};
use crate::models::{ChangeEntry, DetectionResult};

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Progress of a run. Transitions only move forward; any failure ends the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Unvalidated,
    ConfigValid,
    RepoValid,
    MergeBaseFound,
    ChangesCollected,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unvalidated => write!(f, "unvalidated"),
            Self::ConfigValid => write!(f, "config_valid"),
            Self::RepoValid => write!(f, "repo_valid"),
            Self::MergeBaseFound => write!(f, "merge_base_found"),
            Self::ChangesCollected => write!(f, "changes_collected"),
            Self::Done => write!(f, "done"),
        }
    }
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

/// Compares a local branch against a remote branch through their merge-base.
#[derive(Debug, Clone)]
pub struct ConflictDetector<R, S> {
    runner: R,
    remote: S,
    remote_name: String,
}

impl<R, S> ConflictDetector<R, S>
where
    R: GitRunner + Clone + 'static,
    S: RemoteChangeSource + Clone + 'static,
{
    pub fn new(runner: R, remote: S) -> Self {
        Self {
            runner,
            remote,
            remote_name: "origin".to_string(),
        }
    }

    /// Use a remote alias other than `origin` for branch A's tracking ref.
    pub fn with_remote_name(mut self, remote_name: impl Into<String>) -> Self {
        self.remote_name = remote_name.into();
        self
    }

    /// Run the whole pipeline. Never fails: every error, including a panic in
    /// one of the stages, ends up in [`DetectionResult::error`].
    pub async fn detect(&self, config: DetectorConfig) -> DetectionResult {
        let detector = self.clone();
        let handle = tokio::spawn(async move { detector.run(&config).await });

        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(join_err) => Err(DetectorError::Unexpected(join_failure_message(join_err))),
        };

        match outcome {
            Ok(result) => result,
            Err(e) => {
                debug!(error = %e, "conflict detection failed");
                DetectionResult::failure(e.to_string())
            }
        }
    }

    /// Run the pipeline, stopping at the first failing stage.
    #[instrument(skip_all, fields(branch_a = %config.branch_a, branch_b = %config.branch_b))]
    pub async fn run(&self, config: &DetectorConfig) -> Result<DetectionResult, DetectorError> {
        debug!(stage = %Stage::Unvalidated, "starting conflict detection");
        config.validate()?;
        debug!(stage = %Stage::ConfigValid, "configuration validated");

        let git = GitClient::new(self.runner.clone(), &config.local_path);
        validate_repository(&git, &config.branch_b).await?;
        debug!(stage = %Stage::RepoValid, "local repository validated");

        let merge_base =
            resolve_merge_base(&git, &self.remote_name, &config.branch_a, &config.branch_b)
                .await?;
        debug!(stage = %Stage::MergeBaseFound, %merge_base, "merge base resolved");

        let local = collect_local_changes(&git, &merge_base, &config.branch_b).await?;
        let remote = collect_remote_changes(&self.remote, config, &merge_base).await?;
        debug!(
            stage = %Stage::ChangesCollected,
            local = local.len(),
            remote = remote.len(),
            "change sets collected"
        );

        let conflicts = intersect(&local, &remote);
        info!(
            stage = %Stage::Done,
            count = conflicts.len(),
            %merge_base,
            "conflict detection complete"
        );
        Ok(DetectionResult::success(conflicts, merge_base))
    }
}

/// Detect potential conflicts using the real `git` CLI and GitHub API.
///
/// The API host, git binary, remote alias and timeouts come from `settings`.
pub async fn detect_conflicts(
    config: DetectorConfig,
    settings: &DetectorSettings,
) -> DetectionResult {
    let remote = match GitHubClient::from_settings(&settings.github, &config.token) {
        Ok(client) => client,
        Err(e) => {
            debug!(error = %e, "failed to build GitHub client");
            return DetectionResult::failure(DetectorError::RemoteChanges(e).to_string());
        }
    };
    ConflictDetector::new(GitCli::from_settings(&settings.git), remote)
        .with_remote_name(settings.git.remote_name.clone())
        .detect(config)
        .await
}

// ---------------------------------------------------------------------------
// Pipeline steps
// ---------------------------------------------------------------------------

/// Confirm the path is a working tree and `branch` exists locally.
pub async fn validate_repository<R: GitRunner>(
    git: &GitClient<R>,
    branch: &str,
) -> Result<(), DetectorError> {
    let inside = git
        .is_inside_work_tree()
        .await
        .map_err(DetectorError::RepositoryCheck)?;
    if !inside {
        return Err(DetectorError::NotARepository(
            git.repo_path().display().to_string(),
        ));
    }

    let branches = git
        .list_branches()
        .await
        .map_err(DetectorError::RepositoryCheck)?;
    if !branches.iter().any(|b| b == branch) {
        return Err(DetectorError::BranchNotFound(branch.to_string()));
    }
    Ok(())
}

/// Merge-base of `<remote_name>/<branch_a>` and `branch_b`. Blank output is an error.
pub async fn resolve_merge_base<R: GitRunner>(
    git: &GitClient<R>,
    remote_name: &str,
    branch_a: &str,
    branch_b: &str,
) -> Result<String, DetectorError> {
    let tracking_ref = format!("{}/{}", remote_name, branch_a);
    let merge_base = git
        .merge_base(&tracking_ref, branch_b)
        .await
        .map_err(|e| match e {
            // `git merge-base` exits 1 silently when the histories are unrelated.
            GitError::CommandFailed { exit_code: 1, ref stderr } if stderr.is_empty() => {
                DetectorError::MergeBase(format!(
                    "no common ancestor between {} and {}",
                    tracking_ref, branch_b
                ))
            }
            other => DetectorError::MergeBase(other.to_string()),
        })?;

    if merge_base.is_empty() {
        return Err(DetectorError::MergeBase(format!(
            "git merge-base {} {} returned no commit",
            tracking_ref, branch_b
        )));
    }
    Ok(merge_base)
}

/// Changes on `branch` since `merge_base`, from `git diff --name-status`.
pub async fn collect_local_changes<R: GitRunner>(
    git: &GitClient<R>,
    merge_base: &str,
    branch: &str,
) -> Result<Vec<ChangeEntry>, DetectorError> {
    git.diff_name_status(merge_base, branch)
        .await
        .map_err(DetectorError::LocalChanges)
}

/// Changes on branch A since `merge_base`, from the hosting service.
pub async fn collect_remote_changes<S: RemoteChangeSource>(
    remote: &S,
    config: &DetectorConfig,
    merge_base: &str,
) -> Result<Vec<ChangeEntry>, DetectorError> {
    remote
        .compare_files(&config.owner, &config.repo, merge_base, &config.branch_a)
        .await
        .map_err(DetectorError::RemoteChanges)
}

/// Remote paths that also appear locally, in remote order. Duplicates in the
/// remote list are kept.
pub fn intersect(local: &[ChangeEntry], remote: &[ChangeEntry]) -> Vec<String> {
    let local_paths: HashSet<&str> = local.iter().map(|c| c.path.as_str()).collect();
    remote
        .iter()
        .filter(|c| local_paths.contains(c.path.as_str()))
        .map(|c| c.path.clone())
        .collect()
}

fn join_failure_message(err: tokio::task::JoinError) -> String {
    if !err.is_panic() {
        return "conflict detection was cancelled".to_string();
    }
    let payload = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unexpected failure".to_string()
    }
}
