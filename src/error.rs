//! Error types for the chat-to-speech pipeline.

/// Top-level error type for the chat-to-speech system.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// AI backend request or response error.
    #[error("AI error: {0}")]
    Ai(String),

    /// Text-to-speech synthesis or playback error.
    #[error("TTS error: {0}")]
    Tts(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Credential discovery or resolution error.
    #[error("credential error: {0}")]
    Credential(String),

    /// Conversation history persistence error.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, PipelineError>;
