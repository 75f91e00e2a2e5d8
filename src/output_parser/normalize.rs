//! Markdown cleanup for plan text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading run of bullet glyphs, each with its trailing whitespace.
static LEADING_BULLETS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[•\-*]\s*)+").expect("valid bullet regex"));

/// Clean one line: drop every `*`, trim, then strip leading bullets.
///
/// # Examples
///
/// ```
/// use fitplan::output_parser::normalize_line;
///
/// assert_eq!(normalize_line("  • **Squats**: 3 x 12"), "Squats: 3 x 12");
/// assert_eq!(normalize_line("- • nested"), "nested");
/// ```
pub fn normalize_line(line: &str) -> String {
    let without_stars = line.replace('*', "");
    LEADING_BULLETS
        .replace(without_stars.trim(), "")
        .trim()
        .to_string()
}

/// Clean a block line by line and trim the result.
///
/// Idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    text.lines()
        .map(normalize_line)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
