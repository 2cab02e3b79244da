//! Git and GitHub access for mergescout.

pub mod client;
pub mod github;
pub mod parser;

pub use client::{GitCli, GitClient, GitRunner};
pub use github::{GitHubClient, RemoteChangeSource};
