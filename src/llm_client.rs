//! LLM Client for Translation
//!
//! Thin client for an OpenAI-compatible chat-completions endpoint. Requests
//! JSON-object output and parses the model's reply into a structured
//! translation draft; the caller stamps the timestamp.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Settings;
use crate::types::TranslationDraft;

/// LLM configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl LlmConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api_base: settings.openai_base_url.clone(),
            api_key: settings.openai_api_key.clone(),
            model: settings.openai_model.clone(),
            max_tokens: 1024,
            temperature: 0.3,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

const SYSTEM_PROMPT: &str = r#"Translate the given text and explain the grammar.

Respond with a single JSON object and nothing else, using exactly these keys:
{"original_text": "...", "translated_text": "...", "english_grammar": null,
 "japanese_text": null, "hiragana_pronunciation": null, "japanese_grammar": null}

Use null for any field you are not asked to fill."#;

/// LLM client
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!("LLM client: model={}", config.model);
        Ok(Self { client, config })
    }

    pub async fn translate(&self, prompt: &str) -> Result<TranslationDraft> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .context("OPENAI_API_KEY is not set")?;

        let messages = vec![
            Message {
                role: "system".to_string(),
                content: SYSTEM_PROMPT.to_string(),
            },
            Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            },
        ];

        debug!("Calling LLM: model={}", self.config.model);

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&ChatRequest {
                model: self.config.model.clone(),
                messages,
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
                response_format: ResponseFormat {
                    kind: "json_object",
                },
            })
            .send()
            .await
            .context("LLM request failed")?;

        if !resp.status().is_success() {
            let err = resp.text().await.unwrap_or_default();
            anyhow::bail!("LLM error: {}", err);
        }

        let chat: ChatResponse = resp.json().await?;
        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();

        debug!("LLM response: {}", content);

        serde_json::from_str(&content).context("LLM returned malformed translation JSON")
    }
}
