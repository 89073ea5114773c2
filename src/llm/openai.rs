// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Client for OpenAI-compatible chat completion APIs (llama.cpp server,
//! vLLM, Ollama, OpenAI)

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{Generation, LanguageModel, LlmError};
use crate::config::ChatConfig;

// --- OpenAI-compatible serde structs ---

#[derive(serde::Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(serde::Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(serde::Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Upper bound for the `/models` request behind `GET /health`
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

pub struct OpenAiChatClient {
    client: Client,
    endpoint: String,
    model_name: String,
    api_key: Option<String>,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiChatClient {
    /// `endpoint` is the API base, e.g. `http://localhost:8080/v1`
    pub fn new(endpoint: &str, model_name: &str) -> Result<Self, LlmError> {
        let url = reqwest::Url::parse(endpoint)
            .map_err(|e| LlmError::Config(format!("invalid URL {}: {}", endpoint, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(LlmError::Config(format!(
                "unsupported URL scheme in {}",
                endpoint
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!(
            "LLM client configured: endpoint={}, model={}",
            endpoint, model_name
        );

        Ok(Self {
            client,
            endpoint,
            model_name: model_name.to_string(),
            api_key: None,
            max_tokens: 256,
            temperature: 0.1,
        })
    }

    pub fn from_config(config: &ChatConfig) -> Result<Self, LlmError> {
        Ok(Self::new(&config.llm_api_url, &config.model_id)?
            .with_api_key(config.llm_api_key.clone())
            .with_sampling(config.max_new_tokens, config.temperature))
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    fn build_request(&self, prompt: &str) -> ChatRequest {
        ChatRequest {
            model: self.model_name.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

fn parse_chat_response(response: ChatResponse) -> Result<Generation, LlmError> {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|t| !t.trim().is_empty())
        .ok_or(LlmError::EmptyResponse)?;
    let tokens_used = response.usage.map(|u| u.total_tokens).unwrap_or(0);
    Ok(Generation { text, tokens_used })
}

#[async_trait]
impl LanguageModel for OpenAiChatClient {
    async fn generate(&self, prompt: &str) -> Result<Generation, LlmError> {
        let start = Instant::now();
        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .json(&self.build_request(prompt));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("LLM API error {}: {}", status, message);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Unauthorized(message),
                StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited,
                _ => LlmError::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let chat_response: ChatResponse = response.json().await?;
        let generation = parse_chat_response(chat_response)?;
        debug!(
            "Generated {} chars ({} tokens) in {}ms",
            generation.text.len(),
            generation.tokens_used,
            start.elapsed().as_millis()
        );
        Ok(generation)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn health_check(&self) -> bool {
        let mut builder = self
            .client
            .get(format!("{}/models", self.endpoint))
            .timeout(HEALTH_CHECK_TIMEOUT);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        match builder.send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("LLM health check failed: {}", e);
                false
            }
        }
    }
}
