//! Twitch chat adapter (push variant).
//!
//! Connects to Twitch IRC over websocket with the tags capability, answers
//! server PINGs, and forwards PRIVMSG lines as chat events. Echoed
//! self-messages (the bot's own output) are filtered before they reach the
//! pipeline.

use crate::chat::{ChatEvent, ChatSource};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info};

const IRC_WS_URL: &str = "wss://irc-ws.chat.twitch.tv:443";
const AUTH_VALIDATE_URL: &str = "https://id.twitch.tv/oauth2/validate";

/// Push chat source for a Twitch channel.
pub struct TwitchChatSource {
    access_token: String,
    channel: String,
    ws_url: String,
    auth_url: String,
    client: reqwest::Client,
}

impl TwitchChatSource {
    /// Create an adapter for the given channel login.
    #[must_use]
    pub fn new(access_token: &str, channel: &str) -> Self {
        Self {
            access_token: access_token.trim_start_matches("oauth:").to_owned(),
            channel: channel.trim_start_matches('#').to_lowercase(),
            ws_url: IRC_WS_URL.to_owned(),
            auth_url: AUTH_VALIDATE_URL.to_owned(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the websocket and validation endpoints (tests).
    #[must_use]
    pub fn with_endpoints(mut self, ws_url: &str, auth_url: &str) -> Self {
        self.ws_url = ws_url.to_owned();
        self.auth_url = auth_url.to_owned();
        self
    }

    /// Resolve the login of the authenticated bot account.
    async fn validate_token(&self) -> anyhow::Result<String> {
        let response = self
            .client
            .get(&self.auth_url)
            .header("Authorization", format!("OAuth {}", self.access_token))
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("twitch token validation failed ({status})");
        }
        let payload: serde_json::Value = response.json().await?;
        payload
            .get("login")
            .and_then(serde_json::Value::as_str)
            .map(str::to_lowercase)
            .ok_or_else(|| anyhow::anyhow!("twitch token validation response missing login"))
    }
}

#[async_trait]
impl ChatSource for TwitchChatSource {
    fn id(&self) -> &'static str {
        "twitch"
    }

    async fn run(&self, events_tx: mpsc::Sender<ChatEvent>) -> anyhow::Result<()> {
        if self.access_token.trim().is_empty() {
            anyhow::bail!("twitch access token is empty");
        }

        let bot_login = self.validate_token().await?;
        info!("connecting to twitch channel #{} as {bot_login}", self.channel);

        let (stream, _) = tokio_tungstenite::connect_async(&self.ws_url).await?;
        let (mut write, mut read) = stream.split();

        write
            .send(Message::Text(
                "CAP REQ :twitch.tv/tags twitch.tv/commands".into(),
            ))
            .await?;
        write
            .send(Message::Text(format!("PASS oauth:{}", self.access_token).into()))
            .await?;
        write
            .send(Message::Text(format!("NICK {bot_login}").into()))
            .await?;
        write
            .send(Message::Text(format!("JOIN #{}", self.channel).into()))
            .await?;

        while let Some(frame) = read.next().await {
            let raw = match frame {
                Ok(Message::Text(text)) => text.to_string(),
                Ok(Message::Close(_)) => anyhow::bail!("twitch websocket closed"),
                Ok(_) => continue,
                Err(err) => anyhow::bail!("twitch websocket error: {err}"),
            };

            for line in raw.split("\r\n").filter(|l| !l.is_empty()) {
                if let Some(payload) = line.strip_prefix("PING ") {
                    write
                        .send(Message::Text(format!("PONG {payload}").into()))
                        .await?;
                    continue;
                }

                let Some(privmsg) = parse_privmsg(line) else {
                    continue;
                };

                // Skip the bot's own echoed output.
                if privmsg.login == bot_login {
                    debug!("skipping echoed self-message");
                    continue;
                }

                if events_tx.send(privmsg.into_event()).await.is_err() {
                    anyhow::bail!("twitch inbound channel closed");
                }
            }
        }

        anyhow::bail!("twitch websocket stream ended")
    }
}

/// One parsed PRIVMSG line.
#[derive(Debug, PartialEq, Eq)]
struct PrivMsg {
    tags: HashMap<String, String>,
    login: String,
    text: String,
}

impl PrivMsg {
    fn into_event(self) -> ChatEvent {
        let timestamp = self
            .tags
            .get("tmi-sent-ts")
            .and_then(|raw| raw.parse::<i64>().ok())
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .unwrap_or_else(Utc::now);
        let author_name = self
            .tags
            .get("display-name")
            .filter(|name| !name.is_empty())
            .cloned()
            .unwrap_or_else(|| self.login.clone());

        ChatEvent {
            timestamp,
            author_id: self.login,
            author_name,
            body: self.text,
        }
    }
}

/// Parse an IRC line of the shape
/// `@k=v;k=v :login!user@host PRIVMSG #channel :message text`.
fn parse_privmsg(line: &str) -> Option<PrivMsg> {
    let (tags, rest) = if let Some(tagged) = line.strip_prefix('@') {
        let (raw_tags, rest) = tagged.split_once(' ')?;
        (parse_tags(raw_tags), rest)
    } else {
        (HashMap::new(), line)
    };

    let rest = rest.strip_prefix(':')?;
    let (prefix, rest) = rest.split_once(' ')?;
    let login = prefix.split('!').next()?.to_lowercase();

    let (command, rest) = rest.split_once(' ')?;
    if command != "PRIVMSG" {
        return None;
    }

    let (_target, text) = rest.split_once(" :")?;
    Some(PrivMsg {
        tags,
        login,
        text: text.to_owned(),
    })
}

fn parse_tags(raw: &str) -> HashMap<String, String> {
    raw.split(';')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            Some((key.to_owned(), value.to_owned()))
        })
        .collect()
}
