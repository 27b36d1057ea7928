//! AI backend dispatch.
//!
//! Backends are polymorphic over one required operation, `generate`. The
//! concrete implementation is selected via an enumerated configuration value,
//! never via runtime type inspection. Backend failures degrade to a fixed
//! apology string so the audience never sees raw error text.

pub mod gemini;
pub mod openai;

use crate::config::AppConfig;
use crate::error::Result;
use crate::history::ConversationTurn;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::error;

/// Fixed fallback spoken when a backend call fails. The fallback turn still
/// occupies a slot in history.
pub const APOLOGY: &str = "I apologize, but I encountered an error processing your message.";

/// Enumerated AI backend choice (CLI surface).
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AiChoice {
    Openai,
    Gemini,
}

/// AI backend contract.
///
/// `generate` builds a provider-specific prompt/history view and returns the
/// generated text. The pipeline stage blocks on the result, so one
/// conversation turn fully completes before the next chat event is processed.
#[async_trait]
pub trait AiBackend: Send + Sync {
    /// Stable backend identifier (e.g. `openai`, `gemini`).
    fn id(&self) -> &'static str;

    /// Generate a response to `message` given the retained history and the
    /// current system prompt.
    async fn generate(
        &self,
        message: &str,
        history: &VecDeque<ConversationTurn>,
        system_prompt: &str,
    ) -> Result<String>;
}

/// Construct the configured backend.
#[must_use]
pub fn create_backend(choice: AiChoice, config: &AppConfig) -> Arc<dyn AiBackend> {
    match choice {
        AiChoice::Openai => Arc::new(openai::OpenAiBackend::new(config)),
        AiChoice::Gemini => Arc::new(gemini::GeminiBackend::new(config)),
    }
}

/// Invoke the backend, degrading to [`APOLOGY`] on any error.
///
/// The error is logged for the operator but never surfaces to the chat.
pub async fn generate_or_apologize(
    backend: &dyn AiBackend,
    message: &str,
    history: &VecDeque<ConversationTurn>,
    system_prompt: &str,
) -> String {
    match backend.generate(message, history, system_prompt).await {
        Ok(text) => text,
        Err(err) => {
            error!("{} generation failed: {err}", backend.id());
            APOLOGY.to_owned()
        }
    }
}
