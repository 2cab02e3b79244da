//! Domain model types shared by the collectors, the detector, and the CLI.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Change entries
// ---------------------------------------------------------------------------

/// One path reported as changed by a collector.
///
/// `kind` is the source's own vocabulary: git status letters (`M`, `A`, `D`,
/// `R100`, ...) locally, GitHub status words (`modified`, `added`, `removed`,
/// `renamed`, ...) remotely. Only `path` takes part in matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    pub path: String,
    pub kind: String,
}

impl ChangeEntry {
    pub fn new(path: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: kind.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Detection result
// ---------------------------------------------------------------------------

/// Outcome of a detection run.
///
/// When `error` is set, `conflicts` is empty and `merge_base_commit` is `""`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetectionResult {
    /// Paths changed on both sides, in the remote listing's order.
    pub conflicts: Vec<String>,
    /// The merge-base both change lists were computed against.
    pub merge_base_commit: String,
    /// Failure message; short-circuits the other fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DetectionResult {
    pub fn success(conflicts: Vec<String>, merge_base_commit: impl Into<String>) -> Self {
        Self {
            conflicts,
            merge_base_commit: merge_base_commit.into(),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            conflicts: Vec::new(),
            merge_base_commit: String::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
