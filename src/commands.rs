//! Owner command interception.
//!
//! The stream owner can issue administrative commands in-band. Recognized
//! commands divert before AI dispatch and never produce a conversation turn.
//! Unrecognized commands are logged and dropped without any user-visible
//! error.

use crate::chat::ChatEvent;
use tracing::warn;

/// Administrative actions the owner may trigger from chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerCommand {
    /// Clear the conversation store and persist the empty state.
    HistoryReset,
    /// Re-read the system prompt from its source file.
    ReloadPrompt,
}

/// Outcome of command interception for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interception {
    /// Not a command; forward to AI dispatch.
    NotACommand,
    /// Recognized owner command.
    Command(OwnerCommand),
    /// Owner-issued command token with no matching action; drop the event.
    UnknownCommand,
}

/// Inspect an event for an owner command.
///
/// An event is a command when its author is the configured owner and its body
/// begins with the platform's designated prefix (`/` polling, `!` push).
#[must_use]
pub fn intercept(event: &ChatEvent, owner: &str, prefix: char) -> Interception {
    if event.author_id != owner {
        return Interception::NotACommand;
    }
    let Some(rest) = event.body.strip_prefix(prefix) else {
        return Interception::NotACommand;
    };

    match rest.trim().to_lowercase().as_str() {
        "history_reset" => Interception::Command(OwnerCommand::HistoryReset),
        "reload_prompt" => Interception::Command(OwnerCommand::ReloadPrompt),
        other => {
            warn!("unknown owner command: {other:?}");
            Interception::UnknownCommand
        }
    }
}
