// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Language model and prompt configuration

use serde::{Deserialize, Serialize};

use super::{env_opt, env_or, env_parse_or, ConfigError};
use crate::rag::prompt::PromptTemplate;

pub const DEFAULT_ANSWER_TEMPLATE: &str = "
We have provided the contextual facts below.
-----------------
{context_str}
-----------------
Answer the question using only the context and no
prior knowledge. If the context does not contain any fact related to
the question, simply answer the words 'Not found'. The answer should be
maximum 2 sentences directly reflecting the facts from relevant facts while ignoring
irrelevant ones.
Question: {question_str}
Answer:
";

pub const DEFAULT_SPARQL_TEMPLATE: &str = "
Use the question and the additional information to generate a sparql query against a knowledge graph where the p and q items are
completely unknown to you. You will need to discover the p and q items before you can generate the sparql.
Do not assume you know the p and q items for any concepts.
After you generate the sparql, you should display it.

When generating sparql:
* Never enclose the sparql in back-quotes

{examples_str}

Use the following format:

Question: the input question for which you must provide a natural language answer
Information: the additional information you get with the query, in RDF format. This will help you generate the sparql query with the correct format.

Question: {question_str}
Information:
{context_str}
Answer:
";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default = "ChatConfig::from_env")]
pub struct ChatConfig {
    pub model_id: String,
    /// Base URL of an OpenAI-compatible API (e.g. http://localhost:8080/v1)
    pub llm_api_url: String,
    pub llm_api_key: Option<String>,
    pub max_new_tokens: u32,
    /// Prompt budget in tokens, including the generated tokens
    pub max_input_size: usize,
    pub temperature: f32,
    pub num_context_docs: usize,
    pub num_examples: usize,
    pub answer_template: String,
    pub sparql_template: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model_id: "huggyllama/llama-7b".to_string(),
            llm_api_url: "http://localhost:8080/v1".to_string(),
            llm_api_key: None,
            max_new_tokens: 48,
            max_input_size: 2048,
            temperature: 0.1,
            num_context_docs: 3,
            num_examples: 3,
            answer_template: DEFAULT_ANSWER_TEMPLATE.to_string(),
            sparql_template: DEFAULT_SPARQL_TEMPLATE.to_string(),
        }
    }
}

impl ChatConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            model_id: env_or("LLM_MODEL", &defaults.model_id),
            llm_api_url: env_or("LLM_API_URL", &defaults.llm_api_url),
            llm_api_key: env_opt("OPENAI_API_KEY"),
            max_new_tokens: env_parse_or("LLM_MAX_NEW_TOKENS", defaults.max_new_tokens),
            max_input_size: env_parse_or("LLM_MAX_INPUT_SIZE", defaults.max_input_size),
            temperature: env_parse_or("LLM_TEMPERATURE", defaults.temperature),
            ..defaults
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_new_tokens as usize >= self.max_input_size {
            return Err(ConfigError::Invalid {
                field: "max_new_tokens".to_string(),
                message: format!(
                    "must be smaller than max_input_size ({})",
                    self.max_input_size
                ),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid {
                field: "temperature".to_string(),
                message: "must be between 0.0 and 2.0".to_string(),
            });
        }

        check_template(
            "answer_template",
            &self.answer_template,
            &["context_str", "question_str"],
        )?;
        check_template(
            "sparql_template",
            &self.sparql_template,
            &["examples_str", "context_str", "question_str"],
        )?;
        Ok(())
    }
}

fn check_template(field: &str, text: &str, required: &[&str]) -> Result<(), ConfigError> {
    let template = PromptTemplate::new(text);
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|v| !template.variables().iter().any(|t| t == v))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field: field.to_string(),
            message: format!("missing variables: {}", missing.join(", ")),
        })
    }
}
