//! Chat source adapters (YouTube polling, Twitch push).
//!
//! Design goal: platform-specific adapters are pluggable. Each adapter yields
//! normalized [`ChatEvent`]s into a bounded channel; the pipeline owns
//! supervision, dedup, and everything downstream.

pub mod twitch;
pub mod youtube;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

/// One inbound message from the monitored stream's chat feed.
///
/// Immutable once produced by the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    /// Platform-reported message time.
    pub timestamp: DateTime<Utc>,
    /// Platform-scoped author identifier (channel id / login).
    pub author_id: String,
    /// Display name of the author.
    pub author_name: String,
    /// Raw message text.
    pub body: String,
}

/// Chat source adapter contract. New platforms only need to implement this.
///
/// `run` produces events until the underlying feed ends or fails; the
/// supervisor re-invokes it to re-create the subscription. Transient feed
/// errors must be returned, never allowed to take the process down.
#[async_trait]
pub trait ChatSource: Send + Sync {
    /// Stable platform identifier (e.g. `youtube`, `twitch`).
    fn id(&self) -> &'static str;

    /// Read the feed, forwarding normalized events until it ends.
    async fn run(&self, events_tx: mpsc::Sender<ChatEvent>) -> anyhow::Result<()>;
}
