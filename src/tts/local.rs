//! Local synthesis backend.
//!
//! Uses the host speech binary (`say` on macOS, `espeak-ng`/`espeak`
//! elsewhere). No network dependency; blocks until playback completes.

use crate::error::{PipelineError, Result};
use crate::tts::TtsBackend;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

const CANDIDATE_BINARIES: &[&str] = &["say", "espeak-ng", "espeak"];

/// Local TTS via the host speech binary.
pub struct LocalTts {
    binary: PathBuf,
}

impl LocalTts {
    /// Locate a host speech binary.
    ///
    /// # Errors
    ///
    /// Returns an error when none of the candidate binaries is on PATH.
    pub fn new() -> Result<Self> {
        let binary = CANDIDATE_BINARIES
            .iter()
            .find_map(|name| which::which(name).ok())
            .ok_or_else(|| {
                PipelineError::Tts(format!(
                    "no local speech binary found (tried {})",
                    CANDIDATE_BINARIES.join(", ")
                ))
            })?;
        info!("local TTS using {}", binary.display());
        Ok(Self { binary })
    }
}

#[async_trait]
impl TtsBackend for LocalTts {
    fn id(&self) -> &'static str {
        "local"
    }

    async fn speak(&self, text: &str) -> Result<()> {
        let status = tokio::process::Command::new(&self.binary)
            .arg(text)
            .status()
            .await
            .map_err(|e| PipelineError::Tts(format!("failed to run speech binary: {e}")))?;
        if !status.success() {
            return Err(PipelineError::Tts(format!(
                "speech binary exited with {status}"
            )));
        }
        Ok(())
    }
}
