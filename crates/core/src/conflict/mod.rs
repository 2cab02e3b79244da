//! Potential-conflict detection between a local branch and a remote branch.
//!
//! Both sides are reduced to lists of changed paths relative to their
//! merge-base, and the overlap is reported. No content is merged.

pub mod detector;

pub use detector::{detect_conflicts, intersect, ConflictDetector, Stage};
