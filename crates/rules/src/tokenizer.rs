//! `KEY="value"` extraction for naming-rule lines.

/// The key in front of `=` was not the one the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("expected key '{expected}', found '{found}'")]
    KeyMismatch { expected: String, found: String },
}

/// One extracted value and the unconsumed tail of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    pub value: &'a str,
    /// Text after the field's separating comma, starting at the next key.
    pub rest: &'a str,
}

/// Split off the leading comma-delimited segment (the rule keyword).
///
/// Without a comma the whole line is the keyword and the rest is empty.
pub fn split_keyword(line: &str) -> (&str, &str) {
    line.split_once(',').unwrap_or((line, ""))
}

/// Extract the value of `key` (ASCII case-insensitive) from the front of `line`.
///
/// Leading whitespace before the key and after `=` is skipped and one opening
/// `"` is consumed. The value runs to the next `"`, or to the end of the line
/// when there is none. Anything between the closing quote and the next comma
/// is dropped together with the comma.
pub fn extract_value<'a>(line: &'a str, key: &str) -> Result<Field<'a>, TokenError> {
    let line = line.trim_start();
    let Some((left, right)) = line.split_once('=') else {
        return Err(mismatch(key, line));
    };
    if !left.eq_ignore_ascii_case(key) {
        return Err(mismatch(key, left));
    }

    let right = right.trim_start();
    let right = right.strip_prefix('"').unwrap_or(right);
    match right.split_once('"') {
        Some((value, after)) => Ok(Field {
            value,
            rest: after.split_once(',').map(|(_, rest)| rest).unwrap_or(""),
        }),
        None => Ok(Field { value: right, rest: "" }),
    }
}

fn mismatch(expected: &str, found: &str) -> TokenError {
    TokenError::KeyMismatch {
        expected: expected.to_string(),
        found: found.to_string(),
    }
}
