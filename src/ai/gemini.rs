//! Gemini generateContent backend.
//!
//! Same external contract as the OpenAI backend, different role-naming
//! convention: turns are `user`/`model`, and the system prompt is expressed
//! as a leading `model` part.

use crate::ai::AiBackend;
use crate::config::{AppConfig, GeminiConfig};
use crate::error::{PipelineError, Result};
use crate::history::ConversationTurn;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use tracing::debug;

/// AI backend using the Gemini generateContent API.
pub struct GeminiBackend {
    config: GeminiConfig,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiBackend {
    /// Create a backend from the loaded configuration.
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        Self {
            config: config.gemini.clone(),
            api_key: config.keys.gemini.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AiBackend for GeminiBackend {
    fn id(&self) -> &'static str {
        "gemini"
    }

    async fn generate(
        &self,
        message: &str,
        history: &VecDeque<ConversationTurn>,
        system_prompt: &str,
    ) -> Result<String> {
        let contents = build_contents(message, history, system_prompt);
        debug!("gemini request: {} contents", contents.len());
        let body = json!({
            "contents": contents,
            "generationConfig": {
                "temperature": self.config.temperature,
                "topP": self.config.top_p,
                "topK": self.config.top_k,
                "maxOutputTokens": self.config.max_output_tokens,
            }
        });

        let base = self.config.api_url.trim_end_matches('/');
        let url = format!(
            "{base}/v1beta/models/{}:generateContent?key={}",
            self.config.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::Ai(format!("gemini request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Ai(format!(
                "gemini returned {status}: {body}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| PipelineError::Ai(format!("gemini response decode failed: {e}")))?;

        payload
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .map(|text| text.trim().to_owned())
            .ok_or_else(|| PipelineError::Ai("gemini response missing text".to_owned()))
    }
}

/// Linear turn sequence in Gemini's role convention: the system prompt as a
/// leading `model` part, each retained turn as a user/model pair, then the
/// new message as the final user turn.
fn build_contents(
    message: &str,
    history: &VecDeque<ConversationTurn>,
    system_prompt: &str,
) -> Vec<Value> {
    let mut contents = Vec::with_capacity(2 * history.len() + 2);
    if !system_prompt.is_empty() {
        contents.push(json!({ "role": "model", "parts": [{ "text": system_prompt }] }));
    }
    for turn in history {
        contents.push(json!({ "role": "user", "parts": [{ "text": turn.message }] }));
        contents.push(json!({ "role": "model", "parts": [{ "text": turn.response }] }));
    }
    contents.push(json!({ "role": "user", "parts": [{ "text": message }] }));
    contents
}
