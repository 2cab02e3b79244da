//! GitHub REST API client.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::GitHubSettings;
use crate::errors::GitHubError;
use crate::models::ChangeEntry;

/// GitHub stops listing files in a comparison at this count.
const COMPARE_FILE_LIMIT: usize = 300;

/// Source of the remote side's change list.
pub trait RemoteChangeSource: Send + Sync {
    /// Files changed between `base` and `head` in `owner/repo`.
    fn compare_files(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> impl Future<Output = Result<Vec<ChangeEntry>, GitHubError>> + Send;
}

/// Body of `GET /repos/{owner}/{repo}/compare/{base}...{head}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Comparison {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ahead_by: Option<u64>,
    #[serde(default)]
    pub behind_by: Option<u64>,
    #[serde(default)]
    pub files: Option<Vec<ComparisonFile>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonFile {
    pub filename: String,
    pub status: String,
    #[serde(default)]
    pub previous_filename: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// Asynchronous GitHub REST API client.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    base_url: Url,
    token: String,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GitHubError> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let base_url = Url::parse(&api_url)
            .map_err(|e| GitHubError::InvalidUrl(format!("{}: {}", api_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(GitHubError::InvalidUrl(api_url));
        }
        let token = token.into();
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("mergescout/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        info!(api_url = %api_url, "created GitHubClient");
        Ok(Self {
            http,
            api_url,
            base_url,
            token,
        })
    }

    pub fn from_settings(settings: &GitHubSettings, token: &str) -> Result<Self, GitHubError> {
        Self::new(settings.api_url.clone(), token, settings.timeout())
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// `{api_url}/repos/{owner}/{repo}/compare/{base}...{head}` with every
    /// path segment percent-encoded. A `/` inside a ref name stays a path
    /// separator, which is how GitHub reads `feature/x` style branches.
    fn compare_url(&self, owner: &str, repo: &str, base: &str, head: &str) -> Url {
        let basehead = format!("{}...{}", base, head);
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["repos", owner, repo, "compare"])
                .extend(basehead.split('/'));
        }
        url
    }

    /// Compare two commits or branches.
    #[instrument(skip(self))]
    pub async fn compare(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<Comparison, GitHubError> {
        let url = self.compare_url(owner, repo, base, head);
        let resp = self.http.get(url).bearer_auth(&self.token).send().await?;
        let resp = check_response(resp).await?;
        let body = resp.text().await?;
        let comparison: Comparison =
            serde_json::from_str(&body).map_err(|e| GitHubError::ParseError(e.to_string()))?;
        debug!(
            status = comparison.status.as_deref().unwrap_or("unknown"),
            files = comparison.files.as_ref().map_or(0, Vec::len),
            "fetched comparison"
        );
        Ok(comparison)
    }
}

impl RemoteChangeSource for GitHubClient {
    async fn compare_files(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<Vec<ChangeEntry>, GitHubError> {
        let comparison = self.compare(owner, repo, base, head).await?;
        let files = comparison.files.unwrap_or_default();
        if files.len() >= COMPARE_FILE_LIMIT {
            warn!(
                count = files.len(),
                "comparison hit GitHub's file listing limit; results may be incomplete"
            );
        }
        Ok(files
            .into_iter()
            .map(|f| ChangeEntry::new(f.filename, f.status))
            .collect())
    }
}

/// Turn a non-success response into [`GitHubError::ApiError`], carrying the
/// service's `message` field when the body has one.
async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, GitHubError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = api_error_message(status, &body);
    debug!(status = status.as_u16(), %message, "GitHub API request failed");
    Err(GitHubError::ApiError {
        status: Some(status.as_u16()),
        message,
    })
}

fn api_error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {}", status))
}
