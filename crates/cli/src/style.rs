//! Terminal styling for text output.

use console::Style;

/// Success-styled string (green with checkmark).
pub fn success(msg: &str) -> String {
    let style = Style::new().green();
    format!("{} {}", style.apply_to("✓"), msg)
}

/// Error-styled string (red with cross), coloured only when stderr is a terminal.
pub fn error(msg: &str) -> String {
    let style = Style::new().for_stderr().red();
    format!("{} {}", style.apply_to("✗"), msg)
}

/// Warning-styled string (yellow).
pub fn warn(msg: &str) -> String {
    let style = Style::new().yellow();
    format!("{} {}", style.apply_to("⚠"), msg)
}

/// Header-styled string (bold).
pub fn header(msg: &str) -> String {
    Style::new().bold().apply_to(msg).to_string()
}

/// Dim-styled string.
pub fn dim(msg: &str) -> String {
    Style::new().dim().apply_to(msg).to_string()
}
