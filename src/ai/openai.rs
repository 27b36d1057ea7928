//! OpenAI chat-completions backend.

use crate::ai::AiBackend;
use crate::config::{AppConfig, OpenAiConfig};
use crate::error::{PipelineError, Result};
use crate::history::ConversationTurn;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use tracing::debug;

/// AI backend using the OpenAI chat completions API.
pub struct OpenAiBackend {
    config: OpenAiConfig,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiBackend {
    /// Create a backend from the loaded configuration.
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        Self {
            config: config.openai.clone(),
            api_key: config.keys.openai.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AiBackend for OpenAiBackend {
    fn id(&self) -> &'static str {
        "openai"
    }

    async fn generate(
        &self,
        message: &str,
        history: &VecDeque<ConversationTurn>,
        system_prompt: &str,
    ) -> Result<String> {
        let messages = build_messages(message, history, system_prompt);
        debug!("openai request: {} messages", messages.len());
        // Sampling parameters pass through unmodified; the backend rejects
        // out-of-range values.
        let body = json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let base = self.config.api_url.trim_end_matches('/');
        let url = format!("{base}/v1/chat/completions");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::Ai(format!("openai request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Ai(format!(
                "openai returned {status}: {body}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| PipelineError::Ai(format!("openai response decode failed: {e}")))?;

        payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(|text| text.trim().to_owned())
            .ok_or_else(|| PipelineError::Ai("openai response missing content".to_owned()))
    }
}

/// Linear turn sequence: system turn first (when a prompt is set), each
/// retained turn as a user/assistant pair, then the new message as the final
/// user turn.
fn build_messages(
    message: &str,
    history: &VecDeque<ConversationTurn>,
    system_prompt: &str,
) -> Vec<Value> {
    let mut messages = Vec::with_capacity(2 * history.len() + 2);
    if !system_prompt.is_empty() {
        messages.push(json!({ "role": "system", "content": system_prompt }));
    }
    for turn in history {
        messages.push(json!({ "role": "user", "content": turn.message }));
        messages.push(json!({ "role": "assistant", "content": turn.response }));
    }
    messages.push(json!({ "role": "user", "content": message }));
    messages
}
