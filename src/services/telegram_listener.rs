use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;

use crate::models::ChatMessage;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const LONG_POLL_SECS: u64 = 30;
const BASE_RECONNECT_DELAY: Duration = Duration::from_secs(2);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Bot API payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<TgMessage>,
    #[serde(default)]
    channel_post: Option<TgMessage>,
}

#[derive(Debug, Deserialize)]
struct TgMessage {
    message_id: i64,
    date: i64,
    #[serde(default)]
    text: Option<String>,
    chat: TgChat,
    #[serde(default)]
    from: Option<TgUser>,
}

#[derive(Debug, Deserialize)]
struct TgChat {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgUser {
    #[serde(default)]
    username: Option<String>,
}

impl TgMessage {
    /// Text messages only; stickers, photos and the like are dropped.
    fn into_chat_message(self) -> Option<ChatMessage> {
        let text = self.text?;
        let channel_name = if self.chat.kind == "private" {
            "Private".to_string()
        } else {
            self.chat.title.unwrap_or_else(|| "Unknown".into())
        };
        let username = self
            .from
            .and_then(|u| u.username)
            .unwrap_or_else(|| "anonymous".into());

        Some(ChatMessage {
            id: self.message_id.to_string(),
            channel_name,
            text,
            timestamp: DateTime::from_timestamp(self.date, 0).unwrap_or_else(Utc::now),
            username,
        })
    }
}

/// Long-poll the Telegram Bot API and forward text messages into `tx`.
///
/// `connected` is true while the last poll succeeded, which pauses the
/// synthetic sentiment ticker. Runs until `shutdown` flips or `tx` closes.
pub async fn run_telegram_listener(
    bot_token: String,
    tx: mpsc::Sender<ChatMessage>,
    connected: Arc<AtomicBool>,
    mut shutdown: watch::Receiver<bool>,
) {
    let http = match reqwest::Client::builder()
        .timeout(Duration::from_secs(LONG_POLL_SECS + 10))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build Telegram HTTP client");
            return;
        }
    };
    let url = format!("{TELEGRAM_API_BASE}/bot{bot_token}/getUpdates");

    let mut offset: i64 = 0;
    let mut attempt: u32 = 0;

    tracing::info!("Telegram listener started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        let poll = fetch_updates(&http, &url, offset);
        let result = tokio::select! {
            r = poll => r,
            _ = shutdown.changed() => break,
        };

        match result {
            Ok(updates) => {
                if attempt > 0 || !connected.load(Ordering::Relaxed) {
                    tracing::info!("Telegram long poll connected");
                }
                attempt = 0;
                connected.store(true, Ordering::Relaxed);

                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    let Some(msg) = update.message.or(update.channel_post) else {
                        continue;
                    };
                    let Some(chat_message) = msg.into_chat_message() else {
                        continue;
                    };
                    if tx.send(chat_message).await.is_err() {
                        tracing::warn!("Message channel closed, stopping Telegram listener");
                        connected.store(false, Ordering::Relaxed);
                        return;
                    }
                }
            }
            Err(e) => {
                connected.store(false, Ordering::Relaxed);
                attempt += 1;
                let delay = reconnect_delay(attempt);
                tracing::warn!(
                    error = %e,
                    attempt,
                    delay_secs = delay.as_secs(),
                    "Telegram poll failed, backing off"
                );
                tokio::select! {
                    _ = sleep(delay) => {}
                    _ = shutdown.changed() => break,
                }
            }
        }
    }

    connected.store(false, Ordering::Relaxed);
    tracing::info!("Telegram listener stopped");
}

async fn fetch_updates(
    http: &reqwest::Client,
    url: &str,
    offset: i64,
) -> anyhow::Result<Vec<Update>> {
    let offset = offset.to_string();
    let timeout = LONG_POLL_SECS.to_string();
    let resp: UpdatesResponse = http
        .get(url)
        .query(&[
            ("offset", offset.as_str()),
            ("timeout", timeout.as_str()),
            ("allowed_updates", r#"["message","channel_post"]"#),
        ])
        .send()
        .await?
        .json()
        .await?;

    if !resp.ok {
        anyhow::bail!(
            "getUpdates rejected: {}",
            resp.description.unwrap_or_else(|| "no description".into())
        );
    }

    Ok(resp.result)
}

fn reconnect_delay(attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1).min(16));
    BASE_RECONNECT_DELAY
        .saturating_mul(factor)
        .min(MAX_RECONNECT_DELAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconnect_delay_backs_off_and_caps() {
        assert_eq!(reconnect_delay(1), Duration::from_secs(2));
        assert_eq!(reconnect_delay(2), Duration::from_secs(4));
        assert_eq!(reconnect_delay(5), Duration::from_secs(32));
        assert_eq!(reconnect_delay(6), MAX_RECONNECT_DELAY);
        assert_eq!(reconnect_delay(40), MAX_RECONNECT_DELAY);
    }

    #[test]
    fn test_group_message_conversion() {
        let json = r#"{
            "ok": true,
            "result": [{
                "update_id": 10,
                "message": {
                    "message_id": 77,
                    "date": 1709294400,
                    "text": "ETH to the moon",
                    "chat": {"id": -100, "type": "supergroup", "title": "Alpha Calls"},
                    "from": {"id": 1, "username": "degen"}
                }
            }]
        }"#;
        let resp: UpdatesResponse = serde_json::from_str(json).unwrap();
        let update = resp.result.into_iter().next().unwrap();
        let msg = update.message.unwrap().into_chat_message().unwrap();

        assert_eq!(msg.id, "77");
        assert_eq!(msg.channel_name, "Alpha Calls");
        assert_eq!(msg.username, "degen");
        assert_eq!(msg.text, "ETH to the moon");
        assert_eq!(msg.timestamp.timestamp(), 1709294400);
    }

    #[test]
    fn test_private_and_anonymous_defaults() {
        let json = r#"{"message_id": 1, "date": 0, "text": "hi", "chat": {"id": 5, "type": "private"}}"#;
        let msg: TgMessage = serde_json::from_str(json).unwrap();
        let chat = msg.into_chat_message().unwrap();
        assert_eq!(chat.channel_name, "Private");
        assert_eq!(chat.username, "anonymous");
    }

    #[test]
    fn test_non_text_message_is_dropped() {
        let json = r#"{"message_id": 1, "date": 0, "chat": {"id": 5, "type": "group", "title": "x"}}"#;
        let msg: TgMessage = serde_json::from_str(json).unwrap();
        assert!(msg.into_chat_message().is_none());
    }
}
