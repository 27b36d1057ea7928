//! System prompt loading and reload.
//!
//! The prompt is a single plain-text file read into memory at startup and
//! re-read only when the owner issues a reload command. A missing file falls
//! back to a fixed default with a warning rather than failing startup.

use std::path::PathBuf;
use tracing::{info, warn};

/// Default prompt used when the prompt file is absent.
pub const DEFAULT_PROMPT: &str =
    "You are a friendly VTuber AI assistant. Keep responses concise and engaging.";

/// In-memory system prompt backed by a reloadable text file.
#[derive(Debug, Clone)]
pub struct SystemPrompt {
    path: PathBuf,
    text: String,
}

impl SystemPrompt {
    /// Load the prompt from `path`, falling back to [`DEFAULT_PROMPT`] when
    /// the file cannot be read.
    #[must_use]
    pub fn load(path: PathBuf) -> Self {
        let text = read_or_default(&path);
        Self { path, text }
    }

    /// Current prompt text. AI dispatch reads this on every request.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Re-read the prompt file, replacing the in-memory value.
    pub fn reload(&mut self) {
        self.text = read_or_default(&self.path);
        info!("system prompt reloaded from {}", self.path.display());
    }
}

fn read_or_default(path: &std::path::Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(raw) => raw.trim().to_owned(),
        Err(e) => {
            warn!(
                "prompt file {} unavailable ({e}); using default prompt",
                path.display()
            );
            DEFAULT_PROMPT.to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn missing_file_falls_back_to_default() {
        let prompt = SystemPrompt::load(PathBuf::from("/nonexistent/prompt.txt"));
        assert_eq!(prompt.text(), DEFAULT_PROMPT);
    }

    #[test]
    fn loads_and_trims_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.txt");
        std::fs::write(&path, "Be terse.\n").unwrap();

        let prompt = SystemPrompt::load(path);
        assert_eq!(prompt.text(), "Be terse.");
    }

    #[test]
    fn reload_picks_up_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.txt");
        std::fs::write(&path, "first").unwrap();

        let mut prompt = SystemPrompt::load(path.clone());
        assert_eq!(prompt.text(), "first");

        std::fs::write(&path, "second").unwrap();
        prompt.reload();
        assert_eq!(prompt.text(), "second");
    }

    #[test]
    fn reload_of_deleted_file_restores_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.txt");
        std::fs::write(&path, "custom").unwrap();

        let mut prompt = SystemPrompt::load(path.clone());
        std::fs::remove_file(&path).unwrap();
        prompt.reload();
        assert_eq!(prompt.text(), DEFAULT_PROMPT);
    }
}
