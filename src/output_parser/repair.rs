//! Deterministic cleanup for near-JSON model output.
//!
//! Models asked for JSON commonly leave trailing commas and put raw line
//! breaks inside string values. Both are fixed here with plain string
//! scans before the text goes to `serde_json`.

/// Apply every cleanup step in order: trailing commas, then line breaks.
pub fn clean_json(text: &str) -> String {
    collapse_line_breaks(&remove_trailing_commas(text))
}

/// Remove trailing commas before `}` or `]`, leaving string contents alone.
pub fn remove_trailing_commas(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let mut i = 0;
    let mut in_string = false;
    let mut escape_next = false;

    while i < len {
        if escape_next {
            escape_next = false;
            result.push(chars[i]);
            i += 1;
            continue;
        }

        if in_string {
            if chars[i] == '\\' {
                escape_next = true;
            } else if chars[i] == '"' {
                in_string = false;
            }
            result.push(chars[i]);
            i += 1;
            continue;
        }

        if chars[i] == '"' {
            in_string = true;
            result.push(chars[i]);
            i += 1;
            continue;
        }

        if chars[i] == ',' {
            // Look ahead past whitespace for } or ]
            let mut j = i + 1;
            while j < len && chars[j].is_whitespace() {
                j += 1;
            }
            if j < len && (chars[j] == '}' || chars[j] == ']') {
                i += 1;
                continue;
            }
        }

        result.push(chars[i]);
        i += 1;
    }
    result
}

/// Replace `\n` with a space and drop `\r`.
///
/// Raw line breaks are invalid inside JSON strings; outside strings they are
/// whitespace either way, so the replacement is applied everywhere. Escaped
/// `\\n` sequences are untouched.
pub fn collapse_line_breaks(s: &str) -> String {
    s.chars()
        .filter(|&c| c != '\r')
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect()
}
