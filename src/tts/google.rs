//! Google Cloud TTS remote file-based backend.
//!
//! One HTTP request returns a base64-encoded MP3 payload which is decoded and
//! played synchronously. A non-success status is logged and playback is
//! skipped, not retried.

use crate::config::{AppConfig, GoogleTtsConfig};
use crate::error::{PipelineError, Result};
use crate::tts::{play_mp3, TtsBackend};
use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value};
use tracing::warn;

/// Remote TTS via the Google Cloud text:synthesize API.
pub struct GoogleTts {
    config: GoogleTtsConfig,
    api_key: String,
    client: reqwest::Client,
}

impl GoogleTts {
    /// Create a backend from the loaded configuration.
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        Self {
            config: config.google_tts.clone(),
            api_key: config.keys.google.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TtsBackend for GoogleTts {
    fn id(&self) -> &'static str {
        "google"
    }

    async fn speak(&self, text: &str) -> Result<()> {
        let base = self.config.api_url.trim_end_matches('/');
        let url = format!("{base}/v1/text:synthesize?key={}", self.api_key);
        let body = json!({
            "input": { "text": text },
            "voice": {
                "languageCode": self.config.language_code,
                "name": self.config.voice,
            },
            "audioConfig": { "audioEncoding": "MP3" }
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::Tts(format!("google TTS request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("google TTS returned {status}: {body}; skipping playback");
            return Ok(());
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| PipelineError::Tts(format!("google TTS decode failed: {e}")))?;
        let encoded = payload
            .get("audioContent")
            .and_then(Value::as_str)
            .ok_or_else(|| PipelineError::Tts("google TTS response missing audio".to_owned()))?;
        let audio = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| PipelineError::Tts(format!("google TTS audio not base64: {e}")))?;

        play_mp3(audio).await
    }
}
