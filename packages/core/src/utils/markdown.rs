//! Lightweight markup flattening for description previews
//!
//! Descriptions may carry lightweight markup (emphasis, links, list markers).
//! The tree itself never interprets it; these helpers only flatten it into a
//! single line of plain text for compact display rows and outline exports.

use regex::Regex;
use std::sync::LazyLock;

/// Inline and line-start patterns, applied in order.
///
/// Images run before links and bold before italic because the shorter
/// patterns would otherwise eat part of the longer ones.
static MARKUP_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"!\[([^\]]*)\]\([^)]*\)").unwrap(), "$1"),
        (Regex::new(r"\[([^\]]+)\]\([^)]*\)").unwrap(), "$1"),
        (Regex::new(r"`([^`]+)`").unwrap(), "$1"),
        (Regex::new(r"\*\*([^*]+)\*\*").unwrap(), "$1"),
        (Regex::new(r"__([^_]+)__").unwrap(), "$1"),
        (Regex::new(r"~~([^~]+)~~").unwrap(), "$1"),
        (Regex::new(r"\*([^*\s][^*]*)\*").unwrap(), "$1"),
        (Regex::new(r"\b_([^_]+)_\b").unwrap(), "$1"),
        (Regex::new(r"(?m)^\s*#{1,6}\s+").unwrap(), ""),
        (Regex::new(r"(?m)^\s*>\s?").unwrap(), ""),
        (Regex::new(r"(?m)^\s*(?:[-*+]|\d+\.)\s+").unwrap(), ""),
        (Regex::new(r"<[^>]+>").unwrap(), ""),
    ]
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Flatten lightweight markup into a single line of plain text
///
/// # Examples
///
/// ```
/// use concept_tree_core::utils::strip_markdown;
///
/// assert_eq!(strip_markdown("**Energy** is [conserved](https://x.org)"), "Energy is conserved");
/// assert_eq!(strip_markdown("- first\n- second"), "first second");
/// ```
pub fn strip_markdown(text: &str) -> String {
    let mut flattened = text.to_string();
    for (pattern, replacement) in MARKUP_PATTERNS.iter() {
        flattened = pattern.replace_all(&flattened, *replacement).into_owned();
    }
    WHITESPACE.replace_all(&flattened, " ").trim().to_string()
}

/// Flatten markup and cut the result to at most `max_chars` characters
///
/// Truncated previews end with an ellipsis, which counts toward the limit.
pub fn preview(text: &str, max_chars: usize) -> String {
    let plain = strip_markdown(text);
    if plain.chars().count() <= max_chars {
        return plain;
    }
    if max_chars == 0 {
        return String::new();
    }

    let mut cut: String = plain.chars().take(max_chars - 1).collect();
    cut.truncate(cut.trim_end().len());
    cut.push('…');
    cut
}
