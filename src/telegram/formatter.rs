//! Text shaping for outbound chat messages: HTML escaping, markdown-title
//! conversion and length-limit batching.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::telegram::MESSAGE_LENGTH_LIMIT;

static MARKDOWN_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s*(.+?)\s*$").expect("static regex compile"));

/// Escape the characters the platform's HTML parse mode reserves.
#[must_use]
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Rewrite markdown-style `## Heading` lines into `<b>Heading</b>`, the
/// only heading form the chat platform renders.
#[must_use]
pub fn replace_markdown_titles_to_bold(text: &str) -> String {
    MARKDOWN_TITLE_RE.replace_all(text, "<b>$1</b>").to_string()
}

/// Group topic summaries into ordered batches whose joined length stays
/// under the per-message limit, without reordering and without splitting a
/// summary across batches. A single summary longer than the limit is
/// truncated at a char boundary rather than dropped.
#[must_use]
pub fn split_into_batches(summaries: &[String], limit: usize) -> Vec<Vec<String>> {
    let mut batches: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_len = 0usize;

    for summary in summaries {
        let summary = if summary.chars().count() > limit {
            truncate_chars(summary, limit.saturating_sub(1)) + "…"
        } else {
            summary.clone()
        };

        // Account for the "\n\n" joiner between summaries.
        let added = summary.chars().count() + if current.is_empty() { 0 } else { 2 };
        if !current.is_empty() && current_len + added > limit {
            batches.push(std::mem::take(&mut current));
            current_len = 0;
        }

        current_len += summary.chars().count() + if current.is_empty() { 0 } else { 2 };
        current.push(summary);
    }

    if !current.is_empty() {
        batches.push(current);
    }

    batches
}

/// Convenience wrapper using the platform's documented message limit.
#[must_use]
pub fn split_into_message_batches(summaries: &[String]) -> Vec<Vec<String>> {
    split_into_batches(summaries, MESSAGE_LENGTH_LIMIT)
}

/// Truncate to at most `max_chars` characters, never inside a code point.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
