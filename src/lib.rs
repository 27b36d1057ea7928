//! Chattervox: live stream chat → AI conversation → speech pipeline.
//!
//! One message in, one speech out:
//! Chat feed → dedup → owner commands → AI dispatch → history → TTS
//!
//! # Architecture
//!
//! Platform adapters (`chat`) push normalized events into a bounded channel;
//! a single consumer (`pipeline`) runs each event to completion, dispatching
//! to one of two AI backends (`ai`) and one of four TTS backends (`tts`),
//! with bounded conversational memory persisted after every mutation
//! (`history`).

pub mod ai;
pub mod chat;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod dedup;
pub mod error;
pub mod history;
pub mod pipeline;
pub mod prompt;
pub mod tts;

pub use config::AppConfig;
pub use error::{PipelineError, Result};
pub use pipeline::{Platform, Session};
