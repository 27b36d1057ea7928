//! Session state and the message-processing pipeline.
//!
//! One explicit [`Session`] object carries all shared state (system prompt,
//! conversation store, dedup set, active backends); there are no ambient
//! globals. Both chat regimes feed a bounded channel consumed by a single
//! consumer loop, so each event runs dedup → command interception → AI →
//! store append/persist → speak to completion before the next event is
//! taken. That single consumer is the serialization token that keeps turns
//! coherent and store appends in arrival order.

use crate::ai::{self, AiBackend};
use crate::chat::{ChatEvent, ChatSource};
use crate::commands::{self, Interception, OwnerCommand};
use crate::config::AppConfig;
use crate::dedup::{Deduplicator, EventIdentity};
use crate::error::Result;
use crate::history::{ConversationStore, ConversationTurn};
use crate::prompt::SystemPrompt;
use crate::tts::TtsDispatch;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Selected chat platform, which fixes the scheduling regime, the owner
/// command prefix, and the courtesy delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Platform {
    /// Polling regime.
    Youtube,
    /// Push regime.
    Twitch,
}

impl Platform {
    /// Designated owner-command prefix for this platform.
    #[must_use]
    pub fn command_prefix(self) -> char {
        match self {
            Self::Youtube => '/',
            Self::Twitch => '!',
        }
    }
}

/// All per-session state, created at session start and torn down at session
/// end.
pub struct Session {
    owner: String,
    command_prefix: char,
    courtesy_delay: Option<Duration>,
    prompt: SystemPrompt,
    store: ConversationStore,
    dedup: Deduplicator,
    ai: Arc<dyn AiBackend>,
    tts: TtsDispatch,
}

impl Session {
    /// Build a session from configuration and the selected backends.
    #[must_use]
    pub fn new(
        config: &AppConfig,
        platform: Platform,
        ai: Arc<dyn AiBackend>,
        tts: TtsDispatch,
    ) -> Self {
        let courtesy_delay = match platform {
            Platform::Youtube => Some(config.courtesy_delay()),
            Platform::Twitch => None,
        };
        Self {
            owner: config.channel_owner.clone(),
            command_prefix: platform.command_prefix(),
            courtesy_delay,
            prompt: SystemPrompt::load(config.prompt.path.clone()),
            store: ConversationStore::new(config.history.path.clone(), config.history.max_turns),
            dedup: Deduplicator::new(),
            ai,
            tts,
        }
    }

    /// Retained conversation history.
    #[must_use]
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Current system prompt text.
    #[must_use]
    pub fn prompt_text(&self) -> &str {
        self.prompt.text()
    }

    /// Process one chat event to completion.
    ///
    /// Dedup is checked before any side effect. Owner commands short-circuit
    /// before AI dispatch and never produce a turn. A backend failure still
    /// journals the fallback turn, so failed AI calls occupy a history slot.
    pub async fn handle_event(&mut self, event: ChatEvent) {
        if !self.dedup.insert(EventIdentity::from(&event)) {
            debug!("duplicate event from {} dropped", event.author_id);
            return;
        }

        match commands::intercept(&event, &self.owner, self.command_prefix) {
            Interception::Command(OwnerCommand::HistoryReset) => {
                self.store.clear();
                self.persist();
                info!("conversation history has been reset");
                return;
            }
            Interception::Command(OwnerCommand::ReloadPrompt) => {
                self.prompt.reload();
                return;
            }
            Interception::UnknownCommand => return,
            Interception::NotACommand => {}
        }

        info!(
            "{} [{}] {}",
            event.timestamp, event.author_name, event.body
        );

        let response = ai::generate_or_apologize(
            self.ai.as_ref(),
            &event.body,
            self.store.turns(),
            self.prompt.text(),
        )
        .await;
        info!("response: {response}");

        self.store.append(ConversationTurn {
            timestamp: event.timestamp,
            author: event.author_name.clone(),
            message: event.body.clone(),
            response: response.clone(),
        });
        self.persist();

        if let Err(err) = self.tts.speak(&response).await {
            warn!("TTS playback failed: {err}");
        }

        if let Some(delay) = self.courtesy_delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn persist(&self) {
        if let Err(err) = self.store.save() {
            warn!("history persistence failed; in-memory state remains authoritative: {err}");
        }
    }
}

/// Run the pipeline: supervise the chat source and consume its events until
/// the process is stopped.
///
/// # Errors
///
/// Currently only returns `Ok` after the event channel closes; fatal startup
/// conditions are surfaced before this function is reached.
pub async fn run(
    mut session: Session,
    source: Arc<dyn ChatSource>,
    queue_size: usize,
) -> Result<()> {
    let (events_tx, mut events_rx) = mpsc::channel::<ChatEvent>(queue_size);
    let supervisor = tokio::spawn(supervise_source(source, events_tx));

    while let Some(event) = events_rx.recv().await {
        session.handle_event(event).await;
    }

    supervisor.abort();
    Ok(())
}

/// Keep the feed subscription alive: re-subscribe after a clean end, retry
/// with exponential backoff after a failure. Transient feed errors never take
/// the process down.
async fn supervise_source(source: Arc<dyn ChatSource>, events_tx: mpsc::Sender<ChatEvent>) {
    let mut backoff_secs = 2u64;
    loop {
        match source.run(events_tx.clone()).await {
            Ok(()) => {
                warn!("{} feed ended; re-subscribing", source.id());
                backoff_secs = 2;
            }
            Err(err) => {
                warn!(
                    "{} feed failed: {err}; retrying in {backoff_secs}s",
                    source.id()
                );
            }
        }
        tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
        backoff_secs = backoff_secs.saturating_mul(2).min(60);
    }
}
