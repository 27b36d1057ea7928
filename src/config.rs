//! Configuration types for the chat-to-speech pipeline.
//!
//! Loaded once at startup from a JSON document and treated as read-only for
//! the process lifetime. Only the system prompt text file is reloadable, via
//! an owner command.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Privileged chat identity permitted to issue owner commands.
    pub channel_owner: String,
    /// API credentials, one slot per remote provider.
    pub keys: ApiKeys,
    /// Conversation history persistence settings.
    pub history: HistoryConfig,
    /// System prompt file settings.
    pub prompt: PromptConfig,
    /// OpenAI backend settings.
    pub openai: OpenAiConfig,
    /// Gemini backend settings.
    pub gemini: GeminiConfig,
    /// ElevenLabs TTS settings.
    pub elevenlabs: ElevenLabsConfig,
    /// Google Cloud TTS settings.
    pub google_tts: GoogleTtsConfig,
    /// Fish Audio streaming TTS settings.
    pub fish: FishConfig,
    /// Fixed delay between processed messages under the polling regime, in ms.
    pub courtesy_delay_ms: u64,
    /// Bounded inbound event queue size.
    pub inbound_queue_size: usize,
}

/// API credentials for the remote providers.
///
/// Sampling parameters and voice ids live in the per-provider sections;
/// this groups only the secrets, mirroring the on-disk `keys` object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub openai: String,
    pub gemini: String,
    pub google: String,
    pub elevenlabs: String,
    pub fish: String,
    pub youtube: String,
}

/// Conversation history persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Path of the persisted history file (rewritten wholesale per mutation).
    pub path: PathBuf,
    /// Maximum retained turns; oldest are evicted first beyond this cap.
    pub max_turns: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("chat_history.json"),
            max_turns: 100,
        }
    }
}

/// System prompt file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Plain-text prompt file; absence falls back to the built-in default.
    pub path: PathBuf,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("instructions/prompt.txt"),
        }
    }
}

/// OpenAI chat-completions backend settings.
///
/// Sampling parameters are passed through to the API unmodified; out-of-range
/// values are the backend's responsibility to reject.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// Provider base URL (overridable for tests).
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com".to_owned(),
            model: "gpt-4o-mini".to_owned(),
            temperature: 0.7,
            max_tokens: 256,
        }
    }
}

/// Gemini generateContent backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// Provider base URL (overridable for tests).
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_url: "https://generativelanguage.googleapis.com".to_owned(),
            model: "gemini-1.5-flash".to_owned(),
            temperature: 1.0,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 256,
        }
    }
}

/// ElevenLabs TTS settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevenLabsConfig {
    /// Provider base URL (overridable for tests).
    pub api_url: String,
    pub voice_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.elevenlabs.io".to_owned(),
            voice_id: String::new(),
            stability: 0.75,
            similarity_boost: 0.75,
        }
    }
}

/// Google Cloud TTS settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleTtsConfig {
    /// Provider base URL (overridable for tests).
    pub api_url: String,
    pub language_code: String,
    pub voice: String,
}

impl Default for GoogleTtsConfig {
    fn default() -> Self {
        Self {
            api_url: "https://texttospeech.googleapis.com".to_owned(),
            language_code: "en-US".to_owned(),
            voice: "en-US-Wavenet-D".to_owned(),
        }
    }
}

/// Fish Audio streaming TTS settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FishConfig {
    /// Websocket endpoint for streaming synthesis.
    pub ws_url: String,
    /// Reference voice id.
    pub voice_id: String,
    /// Requested audio container format.
    pub format: String,
    /// Latency mode hint, passed through unmodified.
    pub latency: String,
}

impl Default for FishConfig {
    fn default() -> Self {
        Self {
            ws_url: "wss://api.fish.audio/v1/tts/live".to_owned(),
            voice_id: String::new(),
            format: "mp3".to_owned(),
            latency: "normal".to_owned(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file.
    ///
    /// Missing fields fall back to their defaults; the file itself must exist
    /// and parse.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("failed to read config {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            PipelineError::Config(format!("invalid config {}: {e}", path.display()))
        })?;
        Ok(config)
    }
}

fn default_courtesy_delay_ms() -> u64 {
    1000
}

fn default_inbound_queue_size() -> usize {
    64
}

impl AppConfig {
    /// Courtesy delay as a `Duration`, honouring the default when unset.
    #[must_use]
    pub fn courtesy_delay(&self) -> std::time::Duration {
        let ms = if self.courtesy_delay_ms == 0 {
            default_courtesy_delay_ms()
        } else {
            self.courtesy_delay_ms
        };
        std::time::Duration::from_millis(ms)
    }

    /// Inbound queue size with a sane floor.
    #[must_use]
    pub fn queue_size(&self) -> usize {
        if self.inbound_queue_size == 0 {
            default_inbound_queue_size()
        } else {
            self.inbound_queue_size.max(8)
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn defaults_carry_reference_values() {
        let config = AppConfig::default();
        assert_eq!(config.history.max_turns, 100);
        assert_eq!(config.history.path, PathBuf::from("chat_history.json"));
        assert_eq!(config.elevenlabs.stability, 0.75);
        assert_eq!(config.google_tts.voice, "en-US-Wavenet-D");
        assert_eq!(config.courtesy_delay(), std::time::Duration::from_secs(1));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "channel_owner": "streamer",
                "keys": { "openai": "sk-test" },
                "openai": { "model": "gpt-4.1" }
            }"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.channel_owner, "streamer");
        assert_eq!(config.keys.openai, "sk-test");
        assert_eq!(config.openai.model, "gpt-4.1");
        // untouched sections keep defaults
        assert_eq!(config.gemini.top_k, 40);
        assert_eq!(config.history.max_turns, 100);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let result = AppConfig::load(Path::new("/nonexistent/config.json"));
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn queue_size_has_floor() {
        let config = AppConfig {
            inbound_queue_size: 2,
            ..Default::default()
        };
        assert_eq!(config.queue_size(), 8);
    }
}
