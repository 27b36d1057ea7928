//! End-to-end properties of the message-processing pipeline with stub
//! backends: dedup idempotence, history cap, command short-circuit, failure
//! journaling, and TTS serialization.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use chattervox::ai::{AiBackend, APOLOGY};
use chattervox::chat::ChatEvent;
use chattervox::config::AppConfig;
use chattervox::error::{PipelineError, Result};
use chattervox::history::ConversationTurn;
use chattervox::pipeline::{Platform, Session};
use chattervox::tts::{TtsBackend, TtsDispatch};
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// AI stub that answers `ok-1`, `ok-2`, ... in call order.
struct CountingAi {
    calls: AtomicUsize,
}

impl CountingAi {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AiBackend for CountingAi {
    fn id(&self) -> &'static str {
        "counting-stub"
    }

    async fn generate(
        &self,
        _message: &str,
        _history: &VecDeque<ConversationTurn>,
        _system_prompt: &str,
    ) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("ok-{n}"))
    }
}

/// AI stub that always fails.
struct FailingAi;

#[async_trait]
impl AiBackend for FailingAi {
    fn id(&self) -> &'static str {
        "failing-stub"
    }

    async fn generate(
        &self,
        _message: &str,
        _history: &VecDeque<ConversationTurn>,
        _system_prompt: &str,
    ) -> Result<String> {
        Err(PipelineError::Ai("backend down".to_owned()))
    }
}

/// TTS stub that records spoken text and its active playback window.
struct RecordingTts {
    spoken: Mutex<Vec<String>>,
    windows: Mutex<Vec<(Instant, Instant)>>,
    playback: Duration,
}

impl RecordingTts {
    fn new(playback: Duration) -> Arc<Self> {
        Arc::new(Self {
            spoken: Mutex::new(Vec::new()),
            windows: Mutex::new(Vec::new()),
            playback,
        })
    }

    fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    fn windows(&self) -> Vec<(Instant, Instant)> {
        self.windows.lock().unwrap().clone()
    }
}

#[async_trait]
impl TtsBackend for RecordingTts {
    fn id(&self) -> &'static str {
        "recording-stub"
    }

    async fn speak(&self, text: &str) -> Result<()> {
        let entered = Instant::now();
        tokio::time::sleep(self.playback).await;
        let exited = Instant::now();
        self.spoken.lock().unwrap().push(text.to_owned());
        self.windows.lock().unwrap().push((entered, exited));
        Ok(())
    }
}

fn test_config(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.channel_owner = "owner".to_owned();
    config.history.path = dir.join("history.json");
    config.history.max_turns = 100;
    config.prompt.path = dir.join("prompt.txt");
    // Keep the polling-regime courtesy delay out of test wall time.
    config.courtesy_delay_ms = 1;
    config
}

fn event(i: i64, author: &str, body: &str) -> ChatEvent {
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    ChatEvent {
        timestamp: base + ChronoDuration::seconds(i),
        author_id: author.to_owned(),
        author_name: author.to_owned(),
        body: body.to_owned(),
    }
}

fn persisted_turns(path: &Path) -> Vec<ConversationTurn> {
    let raw = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[tokio::test]
async fn duplicate_event_produces_one_turn_and_one_speak() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let ai = CountingAi::new();
    let tts = RecordingTts::new(Duration::ZERO);
    let mut session = Session::new(
        &config,
        Platform::Twitch,
        ai.clone(),
        TtsDispatch::new(tts.clone()),
    );

    let first = event(1, "viewer", "hello");
    session.handle_event(first.clone()).await;
    session.handle_event(first).await;

    assert_eq!(session.store().len(), 1);
    assert_eq!(ai.call_count(), 1);
    assert_eq!(tts.spoken().len(), 1);
}

#[tokio::test]
async fn cap_scenario_101_events_retains_2_through_101() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let ai = CountingAi::new();
    let tts = RecordingTts::new(Duration::ZERO);
    let mut session = Session::new(
        &config,
        Platform::Twitch,
        ai.clone(),
        TtsDispatch::new(tts),
    );

    for i in 1..=101 {
        session.handle_event(event(i, "viewer", &format!("message {i}"))).await;
    }

    assert_eq!(ai.call_count(), 101);
    assert_eq!(session.store().len(), 100);

    // Turn for event 1 evicted; 2..=101 remain, in arrival order.
    let responses: Vec<&str> = session
        .store()
        .turns()
        .iter()
        .map(|t| t.response.as_str())
        .collect();
    assert_eq!(responses.first(), Some(&"ok-2"));
    assert_eq!(responses.last(), Some(&"ok-101"));
    for (offset, response) in responses.iter().enumerate() {
        assert_eq!(*response, format!("ok-{}", offset + 2));
    }

    // Persisted representation matches the in-memory store.
    let persisted = persisted_turns(&config.history.path);
    assert_eq!(persisted.len(), 100);
    assert_eq!(persisted[0].response, "ok-2");
}

#[tokio::test]
async fn owner_history_reset_short_circuits_ai_and_empties_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let ai = CountingAi::new();
    let tts = RecordingTts::new(Duration::ZERO);
    let mut session = Session::new(
        &config,
        Platform::Youtube,
        ai.clone(),
        TtsDispatch::new(tts.clone()),
    );

    session.handle_event(event(1, "viewer", "hi")).await;
    assert_eq!(session.store().len(), 1);
    let calls_before = ai.call_count();

    session.handle_event(event(2, "owner", "/history_reset")).await;

    assert_eq!(ai.call_count(), calls_before);
    assert!(session.store().is_empty());
    assert!(persisted_turns(&config.history.path).is_empty());
    // No speech for the command either.
    assert_eq!(tts.spoken().len(), 1);
}

#[tokio::test]
async fn owner_reload_prompt_short_circuits_and_updates_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    std::fs::write(&config.prompt.path, "first prompt").unwrap();

    let ai = CountingAi::new();
    let tts = RecordingTts::new(Duration::ZERO);
    let mut session = Session::new(
        &config,
        Platform::Twitch,
        ai.clone(),
        TtsDispatch::new(tts),
    );
    assert_eq!(session.prompt_text(), "first prompt");

    std::fs::write(&config.prompt.path, "second prompt").unwrap();
    session.handle_event(event(1, "owner", "!reload_prompt")).await;

    assert_eq!(session.prompt_text(), "second prompt");
    assert_eq!(ai.call_count(), 0);
    assert!(session.store().is_empty());
}

#[tokio::test]
async fn ai_failure_journals_apology_turn_and_speaks_it() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let tts = RecordingTts::new(Duration::ZERO);
    let mut session = Session::new(
        &config,
        Platform::Twitch,
        Arc::new(FailingAi),
        TtsDispatch::new(tts.clone()),
    );

    session.handle_event(event(1, "viewer", "hello")).await;

    assert_eq!(session.store().len(), 1);
    let turn = session.store().turns().front().unwrap();
    assert_eq!(turn.response, APOLOGY);
    assert_eq!(turn.message, "hello");

    let persisted = persisted_turns(&config.history.path);
    assert_eq!(persisted[0].response, APOLOGY);
    assert_eq!(tts.spoken(), vec![APOLOGY.to_owned()]);
}

#[tokio::test]
async fn concurrent_speaks_never_overlap() {
    let tts = RecordingTts::new(Duration::from_millis(50));
    let dispatch = Arc::new(TtsDispatch::new(tts.clone()));

    let a = {
        let dispatch = Arc::clone(&dispatch);
        tokio::spawn(async move { dispatch.speak("first").await })
    };
    let b = {
        let dispatch = Arc::clone(&dispatch);
        tokio::spawn(async move { dispatch.speak("second").await })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    let windows = tts.windows();
    assert_eq!(windows.len(), 2);
    let (first, second) = if windows[0].0 <= windows[1].0 {
        (windows[0], windows[1])
    } else {
        (windows[1], windows[0])
    };
    // Strictly ordered critical sections: the second enters only after the
    // first has exited.
    assert!(first.1 <= second.0, "playback windows overlapped");
}

#[tokio::test]
async fn unknown_owner_command_is_dropped_silently() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let ai = CountingAi::new();
    let tts = RecordingTts::new(Duration::ZERO);
    let mut session = Session::new(
        &config,
        Platform::Youtube,
        ai.clone(),
        TtsDispatch::new(tts.clone()),
    );

    session.handle_event(event(1, "owner", "/selfdestruct")).await;

    assert_eq!(ai.call_count(), 0);
    assert!(session.store().is_empty());
    assert!(tts.spoken().is_empty());
}

#[tokio::test]
async fn non_owner_prefixed_message_reaches_ai() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let ai = CountingAi::new();
    let tts = RecordingTts::new(Duration::ZERO);
    let mut session = Session::new(
        &config,
        Platform::Youtube,
        ai.clone(),
        TtsDispatch::new(tts),
    );

    session.handle_event(event(1, "viewer", "/history_reset")).await;

    assert_eq!(ai.call_count(), 1);
    assert_eq!(session.store().len(), 1);
}
