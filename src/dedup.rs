//! Deduplication of the at-least-once chat feed.
//!
//! The feed may deliver the same logical event more than once; the pipeline
//! must process each identity at most once per process lifetime. Membership
//! test and mark are a single operation so an event can never pass the check
//! twice. Growth is unbounded for a session, which is bounded by the host
//! process.

use crate::chat::ChatEvent;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Composite identity key for one logical chat event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventIdentity {
    pub timestamp: DateTime<Utc>,
    pub author_id: String,
    pub body: String,
}

impl From<&ChatEvent> for EventIdentity {
    fn from(event: &ChatEvent) -> Self {
        Self {
            timestamp: event.timestamp,
            author_id: event.author_id.clone(),
            body: event.body.clone(),
        }
    }
}

/// In-memory set of processed event identities.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<EventIdentity>,
}

impl Deduplicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Test-and-mark in one step. Returns `true` on first sighting.
    pub fn insert(&mut self, identity: EventIdentity) -> bool {
        self.seen.insert(identity)
    }

    /// Number of distinct identities seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether no identities have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
