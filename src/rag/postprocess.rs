// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Cleanup of raw model output

use regex::Regex;
use std::sync::OnceLock;

/// Answer returned when the context holds nothing relevant
pub const NOT_FOUND_KEYWORD: &str = "Not found.";

/// First non-blank line of the text
pub fn keep_first_line(text: &str) -> &str {
    text.trim_start().lines().next().unwrap_or("").trim_end()
}

/// Replace the whole text with the keyword when it occurs anywhere in it
pub fn drop_if_keyword<'a>(text: &'a str, keyword: &'a str) -> &'a str {
    if text.contains(keyword) {
        keyword
    } else {
        text
    }
}

/// Keep the first line, then collapse it to [`NOT_FOUND_KEYWORD`] if the
/// model admitted it found nothing
pub fn post_process_answer(answer: &str) -> String {
    drop_if_keyword(keep_first_line(answer), NOT_FOUND_KEYWORD).to_string()
}

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n?(.*?)```").expect("fence regex is valid")
    })
}

fn keyword_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // a keyword only counts when followed by SPARQL syntax
        Regex::new(concat!(
            r"(?i)\b(?:",
            r"PREFIX\s+[\w-]*:\s*<",
            r"|(?:BASE|WITH)\s+<",
            r"|(?:SELECT|CONSTRUCT|DESCRIBE|ASK)\s+(?:[?$*<{]|(?:DISTINCT|REDUCED|WHERE)\b)",
            r"|(?:INSERT|DELETE)\s+(?:\{|(?:DATA|WHERE)\b)",
            r")",
        ))
        .expect("keyword regex is valid")
    })
}

/// Pull a SPARQL query out of model output: the first fenced code block if
/// there is one, then everything from the first SPARQL keyword on.
pub fn extract_sparql(output: &str) -> Option<String> {
    let body = fence_regex()
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(output);

    let start = keyword_regex().find(body)?.start();
    let query = body[start..].replace("```", "");
    let query = query.trim();
    if query.is_empty() {
        None
    } else {
        Some(query.to_string())
    }
}
