//! Locating the JSON payload inside a model answer.

/// Strip a surrounding markdown fence.
///
/// Only applies when the (trimmed) text starts with a fence. The opening
/// marker including any language tag (` ```json `) is dropped, as is a
/// closing fence at the end. Text without a leading fence is returned trimmed.
///
/// # Examples
///
/// ```
/// use fitplan::output_parser::extract::strip_fences;
///
/// assert_eq!(strip_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
/// assert_eq!(strip_fences("  {\"a\": 1}  "), "{\"a\": 1}");
/// ```
pub fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(after_ticks) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Language tag runs to the end of the first line; a one-line fence
    // (` ```{"a":1}``` `) has no tag.
    let body = match after_ticks.find('\n') {
        Some(nl) if is_language_tag(&after_ticks[..nl]) => &after_ticks[nl + 1..],
        _ => after_ticks,
    };

    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

fn is_language_tag(s: &str) -> bool {
    s.trim().chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// The span from the first `{` to the last `}`, inclusive.
///
/// Deliberately greedy: prose around a single object is discarded, while
/// nested braces inside it are kept.
///
/// # Examples
///
/// ```
/// use fitplan::output_parser::extract::brace_span;
///
/// let input = r#"Sure! Here is your plan: {"workout": {"a": 1}} Enjoy."#;
/// assert_eq!(brace_span(input), Some(r#"{"workout": {"a": 1}}"#));
/// ```
pub fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}
