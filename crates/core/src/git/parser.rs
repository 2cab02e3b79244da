//! Parsers for plain-text `git` output.

use tracing::debug;

use crate::models::ChangeEntry;

/// Parse `git diff --name-status` output.
///
/// Each non-blank line is trimmed and split on tabs. The first field is the
/// status code; the remaining fields are joined back with tabs to form the
/// path, so a filename containing tabs stays in one piece.
pub fn parse_name_status(output: &str) -> Vec<ChangeEntry> {
    let entries: Vec<ChangeEntry> = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let mut fields = line.split('\t');
            let kind = fields.next().unwrap_or_default();
            let path = fields.collect::<Vec<_>>().join("\t");
            ChangeEntry::new(path, kind)
        })
        .collect();
    debug!(count = entries.len(), "parsed name-status entries");
    entries
}

/// Parse `git branch --list` output into bare branch names.
///
/// git prints a two-column prefix: `* ` for the checked-out branch, `+ ` for a
/// branch checked out in another worktree, two spaces otherwise. One marker
/// is stripped, then surrounding whitespace.
pub fn parse_branch_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| line.strip_prefix(['*', '+']).unwrap_or(line).trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
