//! ElevenLabs remote file-based backend.
//!
//! One HTTP request returns a complete MP3 payload which is decoded and
//! played synchronously. A non-success status is logged and playback is
//! skipped, not retried.

use crate::config::{AppConfig, ElevenLabsConfig};
use crate::error::{PipelineError, Result};
use crate::tts::{play_mp3, TtsBackend};
use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

/// Remote TTS via the ElevenLabs text-to-speech API.
pub struct ElevenLabsTts {
    config: ElevenLabsConfig,
    api_key: String,
    client: reqwest::Client,
}

impl ElevenLabsTts {
    /// Create a backend from the loaded configuration.
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        Self {
            config: config.elevenlabs.clone(),
            api_key: config.keys.elevenlabs.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TtsBackend for ElevenLabsTts {
    fn id(&self) -> &'static str {
        "elevenlabs"
    }

    async fn speak(&self, text: &str) -> Result<()> {
        let base = self.config.api_url.trim_end_matches('/');
        let url = format!("{base}/v1/text-to-speech/{}", self.config.voice_id);
        let body = json!({
            "text": text,
            "voice_settings": {
                "stability": self.config.stability,
                "similarity_boost": self.config.similarity_boost,
            }
        });

        let response = self
            .client
            .post(&url)
            .header("accept", "audio/mpeg")
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::Tts(format!("elevenlabs request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("elevenlabs returned {status}: {body}; skipping playback");
            return Ok(());
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| PipelineError::Tts(format!("elevenlabs payload read failed: {e}")))?;
        play_mp3(audio.to_vec()).await
    }
}
