//! Text processing utilities for message content.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Collapse whitespace and cut `text` to at most `max_chars` characters,
/// appending `...` when something was cut.
pub fn truncate_title(text: &str, max_chars: usize) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(text.trim(), " ");
    if collapsed.chars().count() <= max_chars {
        return collapsed.into_owned();
    }
    let head: String = collapsed.chars().take(max_chars).collect();
    format!("{}...", head.trim_end())
}
