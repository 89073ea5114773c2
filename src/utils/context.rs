// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prompt budget helpers
//!
//! Token counts are estimated at four characters per token, which is close
//! enough for budgeting English text and RDF without loading a tokenizer.

pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate token count for a text
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Check if a text fits in a token budget
pub fn is_within_limits(text: &str, max_tokens: usize) -> bool {
    estimate_tokens(text) <= max_tokens
}

/// Cut a text down to the token budget, preferring to stop at the end of a
/// line so RDF statements are not split
pub fn truncate_to_tokens(text: &str, max_tokens: usize) -> &str {
    if is_within_limits(text, max_tokens) {
        return text;
    }

    let max_chars = max_tokens * CHARS_PER_TOKEN;
    let cut = text
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let head = &text[..cut];

    match head.rfind('\n') {
        Some(newline) if newline > 0 => &head[..newline],
        _ => head,
    }
}
