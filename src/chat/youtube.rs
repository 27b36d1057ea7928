//! YouTube live chat adapter (polling variant).
//!
//! Resolves the active live chat id for a video, then repeatedly fetches
//! message batches while the feed reports itself alive, honouring the
//! server-reported polling interval. When the feed ends, `run` returns
//! `Ok(())` so the supervisor can re-subscribe.

use crate::chat::{ChatEvent, ChatSource};
use crate::config::AppConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Fallback between polls when the server does not report an interval.
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Polling chat source for a YouTube live stream.
pub struct YoutubeChatSource {
    api_url: String,
    api_key: String,
    video_id: String,
    client: reqwest::Client,
}

impl YoutubeChatSource {
    /// Create an adapter for the given video id.
    #[must_use]
    pub fn new(config: &AppConfig, video_id: &str) -> Self {
        Self {
            api_url: "https://www.googleapis.com".to_owned(),
            api_key: config.keys.youtube.clone(),
            video_id: video_id.to_owned(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the API base URL (tests).
    #[must_use]
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_owned();
        self
    }

    async fn resolve_live_chat_id(&self) -> anyhow::Result<String> {
        let url = format!(
            "{}/youtube/v3/videos?part=liveStreamingDetails&id={}&key={}",
            self.api_url, self.video_id, self.api_key
        );
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("video lookup failed ({status})");
        }
        let payload: Value = response.json().await?;
        payload
            .pointer("/items/0/liveStreamingDetails/activeLiveChatId")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| anyhow::anyhow!("video {} has no active live chat", self.video_id))
    }
}

#[async_trait]
impl ChatSource for YoutubeChatSource {
    fn id(&self) -> &'static str {
        "youtube"
    }

    async fn run(&self, events_tx: mpsc::Sender<ChatEvent>) -> anyhow::Result<()> {
        if self.api_key.trim().is_empty() {
            anyhow::bail!("youtube API key is empty");
        }

        let live_chat_id = self.resolve_live_chat_id().await?;
        info!("reading live chat for video {}", self.video_id);

        let mut page_token = String::new();
        loop {
            let mut url = format!(
                "{}/youtube/v3/liveChat/messages?liveChatId={}&part=snippet,authorDetails&key={}",
                self.api_url, live_chat_id, self.api_key
            );
            if !page_token.is_empty() {
                url.push_str("&pageToken=");
                url.push_str(&page_token);
            }

            let response = self.client.get(&url).send().await?;
            if !response.status().is_success() {
                let status = response.status();
                anyhow::bail!("live chat fetch failed ({status})");
            }
            let payload: Value = response.json().await?;

            // The feed reports its own termination.
            if payload.get("offlineAt").is_some() {
                info!("live chat for video {} has ended", self.video_id);
                return Ok(());
            }

            for event in parse_messages(&payload) {
                if events_tx.send(event).await.is_err() {
                    anyhow::bail!("youtube inbound channel closed");
                }
            }

            page_token = payload
                .get("nextPageToken")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();

            let interval_ms = payload
                .get("pollingIntervalMillis")
                .and_then(Value::as_u64)
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
            debug!("next live chat poll in {interval_ms}ms");
            tokio::time::sleep(std::time::Duration::from_millis(interval_ms)).await;
        }
    }
}

/// Normalize one `liveChatMessages` batch into chat events.
///
/// Items missing the author or display text are skipped.
fn parse_messages(payload: &Value) -> Vec<ChatEvent> {
    let Some(items) = payload.get("items").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let body = item
                .pointer("/snippet/displayMessage")
                .and_then(Value::as_str)?;
            let author_id = item
                .pointer("/authorDetails/channelId")
                .and_then(Value::as_str)?;
            let author_name = item
                .pointer("/authorDetails/displayName")
                .and_then(Value::as_str)
                .unwrap_or(author_id);
            let timestamp = item
                .pointer("/snippet/publishedAt")
                .and_then(Value::as_str)
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                .map_or_else(Utc::now, |dt| dt.with_timezone(&Utc));

            Some(ChatEvent {
                timestamp,
                author_id: author_id.to_owned(),
                author_name: author_name.to_owned(),
                body: body.to_owned(),
            })
        })
        .collect()
}
