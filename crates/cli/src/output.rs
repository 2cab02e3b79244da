//! Rendering of detection results as text or JSON.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;

use mergescout_core::DetectionResult;

use crate::style;

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Render a successful result for humans. `styled` enables terminal colours.
pub fn render_text(result: &DetectionResult, styled: bool) -> String {
    let paint = |f: fn(&str) -> String, s: &str| if styled { f(s) } else { s.to_string() };

    let mut out = format!(
        "{} {}\n",
        paint(style::header, "Merge base:"),
        paint(style::dim, &result.merge_base_commit)
    );
    if result.conflicts.is_empty() {
        out.push_str(&paint(style::success, "No potential conflicts found"));
        out.push('\n');
        return out;
    }

    let title = format!("Potential conflicts ({}):", result.conflicts.len());
    out.push_str(&paint(style::warn, &title));
    out.push('\n');
    for path in &result.conflicts {
        out.push_str(&format!("  {}\n", path));
    }
    out
}

/// Serialize the result exactly as the library returns it.
pub fn render_json(result: &DetectionResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize result")
}

/// Write rendered output to `path`, or to `stdout` when `path` is `None`.
pub fn emit(rendered: &str, path: Option<&Path>, stdout: &mut dyn Write) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("failed to write output file {}", path.display())),
        None => stdout
            .write_all(rendered.as_bytes())
            .and_then(|()| stdout.flush())
            .context("failed to write to stdout"),
    }
}

/// Write the report for `result` and print its error, if any, to stderr.
///
/// JSON is always written, error included. Text is written only for a
/// successful run. Returns `Ok(false)` when the run failed.
pub fn report(
    result: &DetectionResult,
    format: OutputFormat,
    path: Option<&Path>,
    styled: bool,
    stdout: &mut dyn Write,
) -> Result<bool> {
    match format {
        OutputFormat::Json => {
            let rendered = render_json(result)?;
            emit(&format!("{}\n", rendered), path, stdout)?;
        }
        OutputFormat::Text if !result.is_error() => {
            emit(&render_text(result, styled), path, stdout)?;
        }
        OutputFormat::Text => {}
    }

    match result.error {
        Some(ref message) => {
            eprintln!("{}", style::error(&format!("Error: {}", message)));
            Ok(false)
        }
        None => Ok(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_text_with_conflicts() {
        let result = DetectionResult::success(
            vec!["src/lib.rs".into(), "README.md".into()],
            "abc123",
        );
        assert_eq!(
            render_text(&result, false),
            "Merge base: abc123\nPotential conflicts (2):\n  src/lib.rs\n  README.md\n"
        );
    }

    #[test]
    fn test_render_text_without_conflicts() {
        let result = DetectionResult::success(Vec::new(), "abc123");
        assert_eq!(
            render_text(&result, false),
            "Merge base: abc123\nNo potential conflicts found\n"
        );
    }

    #[test]
    fn test_render_json_includes_error() {
        let json = render_json(&DetectionResult::failure("GitHub token is required")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["error"], "GitHub token is required");
        assert_eq!(value["conflicts"], serde_json::json!([]));
        assert_eq!(value["merge_base_commit"], "");
    }

    #[test]
    fn test_emit_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let mut stdout = Vec::new();
        emit("{}\n", Some(&path), &mut stdout).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}\n");
        assert!(stdout.is_empty());
    }

    #[test]
    fn test_report_text_success() {
        let result = DetectionResult::success(vec!["a.rs".into()], "abc123");
        let mut stdout = Vec::new();
        let ok = report(&result, OutputFormat::Text, None, false, &mut stdout).unwrap();
        assert!(ok);
        assert_eq!(
            String::from_utf8(stdout).unwrap(),
            "Merge base: abc123\nPotential conflicts (1):\n  a.rs\n"
        );
    }

    #[test]
    fn test_report_text_error_writes_nothing() {
        let result = DetectionResult::failure("Branch 'feature' does not exist locally");
        let mut stdout = Vec::new();
        let ok = report(&result, OutputFormat::Text, None, false, &mut stdout).unwrap();
        assert!(!ok);
        assert!(stdout.is_empty());
    }

    #[test]
    fn test_report_json_error_still_written() {
        let result = DetectionResult::failure("GitHub API error (404): Not Found");
        let mut stdout = Vec::new();
        let ok = report(&result, OutputFormat::Json, None, false, &mut stdout).unwrap();
        assert!(!ok);
        let value: serde_json::Value = serde_json::from_slice(&stdout).unwrap();
        assert_eq!(value["error"], "GitHub API error (404): Not Found");
        assert_eq!(value["conflicts"], serde_json::json!([]));
    }

    #[test]
    fn test_report_json_to_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let result = DetectionResult::success(Vec::new(), "abc123");
        let mut stdout = Vec::new();
        let ok = report(&result, OutputFormat::Json, Some(&path), false, &mut stdout).unwrap();
        assert!(ok);
        assert!(stdout.is_empty());
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["merge_base_commit"], "abc123");
    }

    #[test]
    fn test_report_unwritable_output_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.json");
        let result = DetectionResult::success(Vec::new(), "abc123");
        let mut stdout = Vec::new();
        assert!(report(&result, OutputFormat::Json, Some(&path), false, &mut stdout).is_err());
    }
}
