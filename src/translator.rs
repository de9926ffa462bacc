//! Translator Service
//!
//! The non-task translation path: build a prompt, call the model, stamp the
//! result with the gateway clock (model-provided timestamps are ignored),
//! append it to the translations log, return it.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::llm_client::LlmClient;
use crate::translation_store::TranslationStore;
use crate::types::Translation;
use crate::util::timestamp::utc_now;

pub struct TranslatorService {
    client: LlmClient,
    store: Arc<TranslationStore>,
}

impl TranslatorService {
    pub fn new(client: LlmClient, store: Arc<TranslationStore>) -> Self {
        Self { client, store }
    }

    pub async fn translate_chinese(&self, text: &str, include_grammar: bool) -> Result<Translation> {
        let prompt = build_chinese_prompt(text, include_grammar);
        self.run(&prompt).await
    }

    pub async fn correct_english(&self, text: &str, include_grammar: bool) -> Result<Translation> {
        let prompt = build_english_prompt(text, include_grammar);
        self.run(&prompt).await
    }

    async fn run(&self, prompt: &str) -> Result<Translation> {
        let draft = self.client.translate(prompt).await?;
        let result = draft.stamped(utc_now());
        self.store.save(&result)?;

        info!("Saved translation of {:?}", truncate(&result.original_text, 32));

        Ok(result)
    }
}

fn build_chinese_prompt(text: &str, include_grammar: bool) -> String {
    let grammar_clause = if include_grammar {
        "Provide English and Japanese grammar explanations."
    } else {
        "Skip grammar explanations unless they are critical."
    };
    format!(
        "Translate the following Chinese text to English and Japanese:\n{}\n\
         Also provide Hiragana for the Japanese translation. {}",
        text, grammar_clause
    )
}

fn build_english_prompt(text: &str, include_grammar: bool) -> String {
    let grammar_clause = if include_grammar {
        "Provide English and Japanese grammar explanations."
    } else {
        "Skip grammar explanations unless they are critical."
    };
    format!(
        "Correct the grammar of the following English sentence and provide an explanation.\n\
         Original English: {}\n\
         Also provide a Japanese translation and Hiragana pronunciation. {}",
        text, grammar_clause
    )
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmConfig;
    use httpmock::prelude::*;

    #[test]
    fn test_chinese_prompt_grammar_clause() {
        let with = build_chinese_prompt("你好", true);
        assert!(with.contains("你好"));
        assert!(with.contains("Provide English and Japanese grammar explanations."));

        let without = build_chinese_prompt("你好", false);
        assert!(without.contains("Skip grammar explanations"));
    }

    #[test]
    fn test_english_prompt_includes_original() {
        let prompt = build_english_prompt("He go to school", false);
        assert!(prompt.contains("Original English: He go to school"));
        assert!(prompt.contains("Hiragana pronunciation"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("你好世界", 2), "你好");
        assert_eq!(truncate("hi", 32), "hi");
    }

    #[tokio::test]
    async fn test_translate_stamps_and_saves() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(serde_json::json!({
                    "choices": [{
                        "message": {
                            "role": "assistant",
                            "content": "{\"original_text\":\"你好\",\"translated_text\":\"Hello\"}"
                        }
                    }]
                }));
            })
            .await;

        let client = LlmClient::new(LlmConfig {
            api_base: server.base_url(),
            api_key: Some("test-key".to_string()),
            model: "gpt-4o-2024-08-06".to_string(),
            max_tokens: 1024,
            temperature: 0.3,
            timeout_secs: 5,
        })
        .unwrap();
        let store = Arc::new(TranslationStore::open_in_memory().unwrap());
        let service = TranslatorService::new(client, store);

        let before = utc_now();
        let result = service.translate_chinese("你好", false).await.unwrap();

        assert_eq!(result.translated_text, "Hello");
        // Stamped by the gateway, not the model.
        assert!(result.timestamp >= before - chrono::Duration::seconds(1));
    }
}
