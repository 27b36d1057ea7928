//! Fish Audio streaming backend.
//!
//! Opens a persistent websocket, streams synthesis parameters, receives audio
//! chunks incrementally into a transient file, then invokes an external media
//! player once the stream completes. The transient file is removed
//! unconditionally on success and failure. Errors are surfaced to the caller;
//! this backend never substitutes another voice on its own.

use crate::config::{AppConfig, FishConfig};
use crate::error::{PipelineError, Result};
use crate::tts::TtsBackend;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

/// Streaming TTS via the Fish Audio websocket API.
pub struct FishStreamingTts {
    config: FishConfig,
    api_key: String,
}

impl FishStreamingTts {
    /// Create a backend from the loaded configuration.
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        Self {
            config: config.fish.clone(),
            api_key: config.keys.fish.clone(),
        }
    }

    async fn stream_to_file(&self, text: &str, path: &Path) -> Result<()> {
        let mut request = self
            .config
            .ws_url
            .as_str()
            .into_client_request()
            .map_err(|e| PipelineError::Tts(format!("fish endpoint invalid: {e}")))?;
        let auth = format!("Bearer {}", self.api_key)
            .parse()
            .map_err(|_| PipelineError::Tts("fish API key is not a valid header".to_owned()))?;
        request.headers_mut().insert("Authorization", auth);

        let (stream, _) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| PipelineError::Tts(format!("fish connect failed: {e}")))?;
        let (mut write, mut read) = stream.split();

        let start = json!({
            "event": "start",
            "request": {
                "text": text,
                "reference_id": self.config.voice_id,
                "format": self.config.format,
                "latency": self.config.latency,
            }
        });
        write
            .send(Message::Text(start.to_string().into()))
            .await
            .map_err(|e| PipelineError::Tts(format!("fish start failed: {e}")))?;
        write
            .send(Message::Text(json!({ "event": "stop" }).to_string().into()))
            .await
            .map_err(|e| PipelineError::Tts(format!("fish stop failed: {e}")))?;

        let mut file = tokio::fs::File::create(path).await?;
        let mut received: usize = 0;
        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Binary(chunk)) => {
                    received += chunk.len();
                    file.write_all(&chunk).await?;
                }
                Ok(Message::Text(control)) => {
                    let event: serde_json::Value =
                        serde_json::from_str(&control).unwrap_or_default();
                    match event.get("event").and_then(serde_json::Value::as_str) {
                        Some("finish") => break,
                        Some("error") => {
                            return Err(PipelineError::Tts(format!(
                                "fish stream error: {event}"
                            )));
                        }
                        _ => {}
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(PipelineError::Tts(format!("fish stream failed: {e}")));
                }
            }
        }
        file.flush().await?;

        if received == 0 {
            return Err(PipelineError::Tts("fish stream produced no audio".to_owned()));
        }
        debug!("fish stream wrote {received} bytes to {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl TtsBackend for FishStreamingTts {
    fn id(&self) -> &'static str {
        "fish"
    }

    async fn speak(&self, text: &str) -> Result<()> {
        // Guard removes the transient file on every exit path below.
        let audio = TransientAudioFile::new(&self.config.format);
        self.stream_to_file(text, audio.path()).await?;
        play_with_external_player(audio.path()).await
    }
}

/// Transient audio file in the OS temp directory, removed on drop.
struct TransientAudioFile {
    path: PathBuf,
}

impl TransientAudioFile {
    fn new(format: &str) -> Self {
        let name = format!("chattervox-tts-{}.{format}", uuid::Uuid::new_v4());
        Self {
            path: std::env::temp_dir().join(name),
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TransientAudioFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Play a complete audio file with `mpv`.
///
/// A missing player skips playback with a diagnostic instead of failing the
/// pipeline.
async fn play_with_external_player(path: &Path) -> Result<()> {
    let Ok(player) = which::which("mpv") else {
        warn!("mpv not found; skipping playback (install from https://mpv.io/installation/)");
        return Ok(());
    };

    let status = tokio::process::Command::new(player)
        .arg("--no-terminal")
        .arg(path)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await
        .map_err(|e| PipelineError::Tts(format!("failed to run mpv: {e}")))?;
    if !status.success() {
        return Err(PipelineError::Tts(format!("mpv exited with {status}")));
    }
    Ok(())
}
