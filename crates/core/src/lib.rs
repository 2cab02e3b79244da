//! mergescout core library.
//!
//! Flags files changed on both sides of two divergent branches since their
//! merge-base, without fetching or merging the remote branch. The local side
//! is read through the `git` CLI, the remote side through the GitHub compare
//! API, and the two path lists are intersected.

pub mod config;
pub mod conflict;
pub mod errors;
pub mod git;
pub mod models;

// Re-exports for convenience.
pub use config::{DetectorConfig, DetectorSettings};
pub use conflict::{detect_conflicts, ConflictDetector};
pub use models::{ChangeEntry, DetectionResult};
