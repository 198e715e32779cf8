//! Size-bounded input for downstream analysis.

use serde::Serialize;

/// Analysis cap used when none is configured
pub const DEFAULT_MAX_INPUT_BYTES: usize = 150_000;

/// Text handed to analysis, with a record of whether it was cut
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisInput {
    pub text: String,
    pub truncated: bool,
    /// Length in bytes before truncation
    pub original_len: usize,
}

/// Cap `text` at `max_bytes`
///
/// The cut lands after the last `\n` that fits, so a diff is never left
/// with half a line. When no newline fits, it lands on the last UTF-8 char
/// boundary instead. A code point is never split.
pub fn truncate_for_analysis(text: &str, max_bytes: usize) -> AnalysisInput {
    let original_len = text.len();
    if original_len <= max_bytes {
        return AnalysisInput {
            text: text.to_string(),
            truncated: false,
            original_len,
        };
    }

    let window = &text.as_bytes()[..max_bytes];
    let cut = match window.iter().rposition(|&b| b == b'\n') {
        Some(newline) => newline + 1,
        None => (0..=max_bytes)
            .rev()
            .find(|&i| text.is_char_boundary(i))
            .unwrap_or(0),
    };

    AnalysisInput {
        text: text[..cut].to_string(),
        truncated: true,
        original_len,
    }
}
