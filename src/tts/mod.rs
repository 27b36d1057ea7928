//! TTS backend dispatch and playback serialization.
//!
//! Backends are polymorphic over one required operation, `speak`, selected by
//! an enumerated configuration value. [`TtsDispatch`] serializes all speech
//! through a mutual-exclusion lock guarding the host audio output: exactly
//! one request may be in flight at a time, and the lock is released on every
//! exit path.

pub mod elevenlabs;
pub mod fish;
pub mod google;
pub mod local;

use crate::config::AppConfig;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

/// Enumerated TTS backend choice (CLI surface).
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TtsChoice {
    Local,
    Elevenlabs,
    Google,
    Fish,
}

/// TTS backend contract.
///
/// `speak` blocks (from the caller's perspective) until audio playback
/// completes. Backends that skip playback on provider errors return `Ok` and
/// log; backends whose failures callers must see return `Err`.
#[async_trait]
pub trait TtsBackend: Send + Sync {
    /// Stable backend identifier (e.g. `local`, `fish`).
    fn id(&self) -> &'static str;

    /// Synthesize and play `text`.
    async fn speak(&self, text: &str) -> Result<()>;
}

/// Construct the configured backend.
///
/// # Errors
///
/// Returns an error when the local backend finds no host speech binary.
pub fn create_backend(choice: TtsChoice, config: &AppConfig) -> Result<Arc<dyn TtsBackend>> {
    Ok(match choice {
        TtsChoice::Local => Arc::new(local::LocalTts::new()?),
        TtsChoice::Elevenlabs => Arc::new(elevenlabs::ElevenLabsTts::new(config)),
        TtsChoice::Google => Arc::new(google::GoogleTts::new(config)),
        TtsChoice::Fish => Arc::new(fish::FishStreamingTts::new(config)),
    })
}

/// Serialized speech dispatcher.
///
/// Wraps the selected backend with the playback lock and an optional explicit
/// local fallback. The polling-regime pipeline constructs the dispatcher with
/// the fallback; the push-regime pipeline deliberately does not, so repeated
/// remote failures stay visible instead of being masked by another voice.
pub struct TtsDispatch {
    backend: Arc<dyn TtsBackend>,
    fallback: Option<Arc<dyn TtsBackend>>,
    playback_lock: Mutex<()>,
}

impl TtsDispatch {
    /// Dispatcher without a fallback: backend failures surface to the caller.
    #[must_use]
    pub fn new(backend: Arc<dyn TtsBackend>) -> Self {
        Self {
            backend,
            fallback: None,
            playback_lock: Mutex::new(()),
        }
    }

    /// Attach an explicit fallback tried after a primary failure.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Arc<dyn TtsBackend>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Identifier of the active primary backend.
    #[must_use]
    pub fn backend_id(&self) -> &'static str {
        self.backend.id()
    }

    /// Speak `text` under the playback lock.
    ///
    /// # Errors
    ///
    /// Returns the primary backend's error when no fallback is attached, or
    /// the fallback's error when both fail.
    pub async fn speak(&self, text: &str) -> Result<()> {
        let _guard = self.playback_lock.lock().await;
        match self.backend.speak(text).await {
            Ok(()) => Ok(()),
            Err(err) => match &self.fallback {
                Some(fallback) => {
                    warn!(
                        "{} TTS failed: {err}; falling back to {}",
                        self.backend.id(),
                        fallback.id()
                    );
                    fallback.speak(text).await
                }
                None => Err(err),
            },
        }
    }
}

/// Decode a complete MP3 payload and play it to the default audio output,
/// blocking the calling task until playback ends.
pub(crate) async fn play_mp3(data: Vec<u8>) -> Result<()> {
    tokio::task::spawn_blocking(move || -> Result<()> {
        let stream = rodio::OutputStreamBuilder::open_default_stream()
            .map_err(|e| PipelineError::Tts(format!("audio output unavailable: {e}")))?;
        let sink = rodio::Sink::connect_new(stream.mixer());
        let source = rodio::Decoder::new(std::io::Cursor::new(data))
            .map_err(|e| PipelineError::Tts(format!("audio decode failed: {e}")))?;
        sink.append(source);
        sink.sleep_until_end();
        Ok(())
    })
    .await
    .map_err(|e| PipelineError::Tts(format!("playback task panicked: {e}")))?
}
