//! Bounded conversation history with rewrite-on-write persistence.
//!
//! The store is the sole shared mutable state between AI dispatch and
//! persistence. It owns its turns exclusively and evicts oldest-first once
//! the retention cap is exceeded. Every mutation rewrites the persisted JSON
//! file wholesale; this is a deliberate simplicity/durability trade-off, not
//! a performance path.

use crate::error::{PipelineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::PathBuf;

/// One (message, response) exchange. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// When the inbound message was produced by the chat feed.
    #[serde(rename = "datetime", alias = "timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Display name of the chat author.
    pub author: String,
    /// Raw inbound message text.
    pub message: String,
    /// Generated (or fallback) response text.
    pub response: String,
}

/// Ordered, capped sequence of conversation turns.
///
/// Insertion order is chronological order. Oldest turns are evicted first
/// (FIFO) whenever the cap is exceeded.
#[derive(Debug)]
pub struct ConversationStore {
    turns: VecDeque<ConversationTurn>,
    max_turns: usize,
    path: PathBuf,
}

impl ConversationStore {
    /// Create an empty store persisting to `path`, retaining at most
    /// `max_turns` turns.
    #[must_use]
    pub fn new(path: PathBuf, max_turns: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(max_turns.min(128)),
            max_turns,
            path,
        }
    }

    /// Append a turn, evicting the oldest if at capacity.
    pub fn append(&mut self, turn: ConversationTurn) {
        if self.max_turns > 0 && self.turns.len() >= self.max_turns {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    /// Drop all retained turns.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Retained turns, oldest first.
    #[must_use]
    pub fn turns(&self) -> &VecDeque<ConversationTurn> {
        &self.turns
    }

    /// Number of retained turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the store holds no turns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Path of the persisted history file.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Rewrite the persisted representation wholesale.
    ///
    /// Callers treat failure as non-fatal: the in-memory store remains
    /// authoritative for the rest of the session.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails.
    pub fn save(&self) -> Result<()> {
        let turns: Vec<&ConversationTurn> = self.turns.iter().collect();
        let json = serde_json::to_string_pretty(&turns)
            .map_err(|e| PipelineError::Persistence(format!("serialize history: {e}")))?;
        std::fs::write(&self.path, json).map_err(|e| {
            PipelineError::Persistence(format!(
                "write history {}: {e}",
                self.path.display()
            ))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn turn(i: usize) -> ConversationTurn {
        ConversationTurn {
            timestamp: Utc::now(),
            author: format!("viewer-{i}"),
            message: format!("message {i}"),
            response: format!("ok-{i}"),
        }
    }

    #[test]
    fn append_keeps_insertion_order() {
        let mut store = ConversationStore::new(PathBuf::from("unused.json"), 10);
        store.append(turn(1));
        store.append(turn(2));

        let turns: Vec<_> = store.turns().iter().collect();
        assert_eq!(turns[0].response, "ok-1");
        assert_eq!(turns[1].response, "ok-2");
    }

    #[test]
    fn cap_evicts_oldest_first() {
        let mut store = ConversationStore::new(PathBuf::from("unused.json"), 100);
        for i in 1..=101 {
            store.append(turn(i));
        }

        assert_eq!(store.len(), 100);
        // turn 1 evicted; 2..=101 remain in order
        assert_eq!(store.turns().front().unwrap().response, "ok-2");
        assert_eq!(store.turns().back().unwrap().response, "ok-101");
    }

    #[test]
    fn clear_empties_store() {
        let mut store = ConversationStore::new(PathBuf::from("unused.json"), 10);
        store.append(turn(1));
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn save_rewrites_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let mut store = ConversationStore::new(path.clone(), 10);

        store.append(turn(1));
        store.save().unwrap();
        store.append(turn(2));
        store.save().unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<ConversationTurn> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].response, "ok-2");
    }

    #[test]
    fn turn_serializes_with_datetime_key() {
        let value = serde_json::to_value(turn(1)).unwrap();
        assert!(value.get("datetime").is_some());
        assert!(value.get("timestamp").is_none());

        // legacy files using "timestamp" still deserialize
        let legacy = serde_json::json!({
            "timestamp": Utc::now(),
            "author": "a",
            "message": "m",
            "response": "r"
        });
        let parsed: ConversationTurn = serde_json::from_value(legacy).unwrap();
        assert_eq!(parsed.author, "a");
    }

    #[test]
    fn save_to_bad_path_is_persistence_error() {
        let store = ConversationStore::new(PathBuf::from("/nonexistent/dir/h.json"), 10);
        assert!(matches!(
            store.save(),
            Err(PipelineError::Persistence(_))
        ));
    }
}
