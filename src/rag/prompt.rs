// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prompt templates with `{variable}` placeholders
//!
//! Only braces around a bare identifier are placeholders, so SPARQL group
//! patterns such as `{ ?s ?p ?o }` pass through untouched. `{{` and `}}`
//! produce literal braces.

use regex::Regex;
use std::sync::OnceLock;

use super::errors::RagError;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex is valid")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Variable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
    variables: Vec<String>,
}

impl PromptTemplate {
    pub fn new(template: &str) -> Self {
        let mut segments = Vec::new();
        let mut variables: Vec<String> = Vec::new();
        let mut text = String::new();
        let mut last = 0;

        for caps in placeholder_regex().captures_iter(template) {
            let Some(whole) = caps.get(0) else { continue };
            text.push_str(&template[last..whole.start()]);
            last = whole.end();

            match caps.get(1) {
                Some(name) => {
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    let name = name.as_str().to_string();
                    if !variables.contains(&name) {
                        variables.push(name.clone());
                    }
                    segments.push(Segment::Variable(name));
                }
                None if whole.as_str() == "{{" => text.push('{'),
                None => text.push('}'),
            }
        }
        text.push_str(&template[last..]);
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Self {
            segments,
            variables,
        }
    }

    /// Variable names in order of first appearance
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Fill every placeholder. Extra values are ignored; a missing one is
    /// an error.
    pub fn format(&self, values: &[(&str, &str)]) -> Result<String, RagError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Variable(name) => {
                    let value = values
                        .iter()
                        .find(|(key, _)| key == name)
                        .map(|(_, value)| *value)
                        .ok_or_else(|| RagError::MissingVariable(name.clone()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}
