//! Shared helpers for mergescout integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::process::Command;
use std::sync::{Arc, Mutex};

use axum::extract::{Path as UrlPath, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::Router;
use git2::{IndexAddOption, Oid, Repository, RepositoryInitOptions, Signature};

// ===========================================================================
// Fake GitHub API
// ===========================================================================

/// A request seen by the fake GitHub server.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub owner: String,
    pub repo: String,
    pub basehead: String,
    pub authorization: Option<String>,
    pub accept: Option<String>,
}

#[derive(Clone)]
struct FakeGitHub {
    status: StatusCode,
    body: String,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

async fn compare_handler(
    State(fake): State<FakeGitHub>,
    UrlPath((owner, repo, basehead)): UrlPath<(String, String, String)>,
    headers: HeaderMap,
) -> (StatusCode, String) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    fake.seen.lock().unwrap().push(SeenRequest {
        owner,
        repo,
        basehead,
        authorization: header("authorization"),
        accept: header("accept"),
    });
    (fake.status, fake.body.clone())
}

/// Serve a canned reply for every compare request. Returns the base URL and
/// the log of requests received.
pub async fn spawn_fake_github(
    status: StatusCode,
    body: impl Into<String>,
) -> (String, Arc<Mutex<Vec<SeenRequest>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let fake = FakeGitHub {
        status,
        body: body.into(),
        seen: seen.clone(),
    };
    let app = Router::new()
        .route("/repos/:owner/:repo/compare/*basehead", get(compare_handler))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), seen)
}

/// JSON body of a compare response listing `files` as `(filename, status)`.
pub fn compare_body(files: &[(&str, &str)]) -> String {
    let files: Vec<serde_json::Value> = files
        .iter()
        .map(|(name, status)| serde_json::json!({ "filename": name, "status": status }))
        .collect();
    serde_json::json!({
        "status": "diverged",
        "ahead_by": 1,
        "behind_by": 1,
        "files": files,
    })
    .to_string()
}

// ===========================================================================
// Git fixtures
// ===========================================================================

/// Returns `true` if `git` is available on `$PATH`.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Initialise a repository whose initial branch is `main`.
pub fn init_repo(path: &Path) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    Repository::init_opts(path, &opts).unwrap()
}

/// Write `files` into the working tree, stage everything, and commit onto
/// `update_ref` with the given parents.
pub fn commit_files(
    repo: &Repository,
    update_ref: &str,
    parents: &[Oid],
    files: &[(&str, &str)],
    message: &str,
) -> Oid {
    let workdir = repo.workdir().unwrap().to_path_buf();
    for (name, content) in files {
        let path = workdir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree_oid = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_oid).unwrap();

    let sig = Signature::now("Test", "test@example.com").unwrap();
    let parent_commits: Vec<git2::Commit> = parents
        .iter()
        .map(|oid| repo.find_commit(*oid).unwrap())
        .collect();
    let parent_refs: Vec<&git2::Commit> = parent_commits.iter().collect();
    repo.commit(Some(update_ref), &sig, &sig, message, &tree, &parent_refs)
        .unwrap()
}

/// Two diverged histories on top of a shared base:
///
/// - `feature` (local): modifies `a.txt`, `c.txt`
/// - `origin/main` (remote-tracking): modifies `a.txt`, `b.txt`, adds `d.txt`
///
/// Returns the repository and the base commit id.
pub fn diverged_repo(path: &Path) -> (Repository, Oid) {
    let repo = init_repo(path);
    let base = commit_files(
        &repo,
        "HEAD",
        &[],
        &[("a.txt", "a\n"), ("b.txt", "b\n"), ("c.txt", "c\n")],
        "base",
    );
    commit_files(
        &repo,
        "refs/heads/feature",
        &[base],
        &[("a.txt", "a local\n"), ("c.txt", "c local\n")],
        "local work",
    );
    commit_files(
        &repo,
        "refs/remotes/origin/main",
        &[base],
        &[
            ("a.txt", "a remote\n"),
            ("b.txt", "b remote\n"),
            ("c.txt", "c\n"),
            ("d.txt", "d\n"),
        ],
        "remote work",
    );
    (repo, base)
}
