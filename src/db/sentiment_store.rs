use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::json_file::{self, StoreError};
use crate::intelligence::SentimentAggregator;
use crate::models::{ChatMessage, TokenSentiment};
use crate::services::fallback::DegradedMode;

/// Number of recent messages written to the snapshot file.
const PERSISTED_MESSAGES: usize = 20;

/// On-disk layout of the sentiment snapshot.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SentimentFile {
    #[serde(default)]
    tokens: BTreeMap<String, TokenSentiment>,
    #[serde(default)]
    messages: Vec<ChatMessage>,
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
}

/// All token sentiments at a point in time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentSnapshot {
    pub tokens: BTreeMap<String, TokenSentiment>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug)]
struct State {
    aggregator: SentimentAggregator,
    /// Newest first.
    messages: VecDeque<ChatMessage>,
}

/// Sentiment counters plus the recent-message window, flushed to a JSON
/// file after every mutation.
#[derive(Debug)]
pub struct SentimentStore {
    path: PathBuf,
    watched: Vec<String>,
    capacity: usize,
    state: Mutex<State>,
}

impl SentimentStore {
    /// Empty store that has not touched the disk yet.
    pub fn new(path: impl Into<PathBuf>, watched: Vec<String>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            watched: watched.into_iter().map(|t| t.to_uppercase()).collect(),
            capacity: capacity.max(1),
            state: Mutex::new(State {
                aggregator: SentimentAggregator::new(),
                messages: VecDeque::new(),
            }),
        }
    }

    /// Restore counters and messages from `path`. Missing or corrupt files
    /// give an empty store.
    pub async fn load(path: impl Into<PathBuf>, watched: Vec<String>, capacity: usize) -> Self {
        let store = Self::new(path, watched, capacity);

        let file = match json_file::read_json::<SentimentFile>(&store.path).await {
            Ok(Some(file)) => file,
            Ok(None) => return store,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load sentiment snapshot, starting empty");
                return store;
            }
        };

        {
            let mut state = store.state.lock().await;
            state.aggregator = SentimentAggregator::from_entries(file.tokens.into_values());
            state.messages = file.messages.into_iter().take(store.capacity).collect();
            tracing::info!(
                tokens = state.aggregator.tokens().len(),
                messages = state.messages.len(),
                "Sentiment snapshot loaded"
            );
        }

        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn watched_tokens(&self) -> &[String] {
        &self.watched
    }

    /// Add a message to the window and fold it into the counters.
    /// Returns the tokens whose sentiment changed.
    pub async fn ingest(&self, message: ChatMessage) -> Result<Vec<String>, StoreError> {
        let mut state = self.state.lock().await;

        let changed = state
            .aggregator
            .apply(&message.text, &self.watched, Utc::now());

        for token in &changed {
            if let Some(s) = state.aggregator.get(token) {
                tracing::debug!(token = %token, label = %s.label, "Updated sentiment");
            }
        }

        state.messages.push_front(message);
        while state.messages.len() > self.capacity {
            state.messages.pop_back();
        }

        self.write(&state).await?;
        Ok(changed)
    }

    /// Current sentiment for `token`, creating a zero entry for unseen tokens.
    pub async fn get(&self, token: &str) -> TokenSentiment {
        let mut state = self.state.lock().await;
        let existed = state.aggregator.contains(token);
        let entry = state.aggregator.get_or_create(token, Utc::now());

        if !existed {
            if let Err(e) = self.write(&state).await {
                tracing::error!(error = %e, token = %entry.token, "Failed to persist new sentiment entry");
            }
        }

        entry
    }

    pub async fn snapshot(&self) -> SentimentSnapshot {
        let state = self.state.lock().await;
        SentimentSnapshot {
            tokens: state.aggregator.tokens().clone(),
            last_updated: Utc::now(),
        }
    }

    /// Recent messages, newest first.
    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.state.lock().await.messages.iter().cloned().collect()
    }

    /// Synthetic update for every watched token: unseen tokens get a mock
    /// entry, known ones a small additive nudge. Counters never go down.
    pub async fn synthetic_tick(&self, fallback: &DegradedMode) -> Result<Vec<String>, StoreError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        for token in &self.watched {
            if !state.aggregator.contains(token) {
                state.aggregator.seed(fallback.mock_sentiment(token));
            } else {
                let (buys, sells, neutral) = fallback.nudge();
                state.aggregator.nudge(token, buys, sells, neutral, now);
            }
        }

        self.write(&state).await?;
        Ok(self.watched.clone())
    }

    /// Reset every counter. Messages are kept.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.aggregator.clear();
        self.write(&state).await
    }

    pub async fn flush(&self) -> Result<(), StoreError> {
        let state = self.state.lock().await;
        self.write(&state).await
    }

    async fn write(&self, state: &State) -> Result<(), StoreError> {
        let file = SentimentFile {
            tokens: state.aggregator.tokens().clone(),
            messages: state.messages.iter().take(PERSISTED_MESSAGES).cloned().collect(),
            last_updated: Some(Utc::now()),
        };
        json_file::write_json(&self.path, &file).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SentimentLabel;

    fn tokens() -> Vec<String> {
        vec!["ETH".into(), "btc".into()]
    }

    fn message(i: usize, text: &str) -> ChatMessage {
        ChatMessage {
            id: i.to_string(),
            channel_name: "alpha".into(),
            text: text.into(),
            timestamp: Utc::now(),
            username: "tester".into(),
        }
    }

    fn store(capacity: usize) -> (tempfile::TempDir, SentimentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SentimentStore::new(dir.path().join("sentiment.json"), tokens(), capacity);
        (dir, store)
    }

    #[tokio::test]
    async fn test_ingest_updates_only_mentioned_token() {
        let (_dir, store) = store(10);
        let changed = store.ingest(message(1, "ETH is going to moon")).await.unwrap();
        assert_eq!(changed, vec!["ETH".to_string()]);

        let snap = store.snapshot().await;
        assert_eq!(snap.tokens["ETH"].buy_count, 1);
        assert!(!snap.tokens.contains_key("BTC"));
    }

    #[tokio::test]
    async fn test_message_window_evicts_oldest_first() {
        let (_dir, store) = store(3);
        for i in 0..5 {
            store.ingest(message(i, "gm")).await.unwrap();
        }

        let ids: Vec<String> = store.messages().await.into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["4", "3", "2"]);
    }

    #[tokio::test]
    async fn test_file_keeps_twenty_newest_messages() {
        let (_dir, store) = store(50);
        for i in 0..30 {
            store.ingest(message(i, "gm")).await.unwrap();
        }
        assert_eq!(store.messages().await.len(), 30);

        let raw = tokio::fs::read(store.path()).await.unwrap();
        let file: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        let ids: Vec<&str> = file["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_str().unwrap())
            .collect();

        assert_eq!(ids.len(), PERSISTED_MESSAGES);
        assert_eq!(ids.first(), Some(&"29"));
        assert_eq!(ids.last(), Some(&"10"));

        // A reload starts from exactly what was persisted
        let reloaded = SentimentStore::load(store.path(), tokens(), 50).await;
        let reloaded_ids: Vec<String> = reloaded.messages().await.into_iter().map(|m| m.id).collect();
        assert_eq!(reloaded_ids, ids);
    }

    #[tokio::test]
    async fn test_get_lazily_creates_and_persists() {
        let (_dir, store) = store(10);
        let entry = store.get("pepe").await;
        assert_eq!(entry.token, "PEPE");
        assert_eq!(entry.label, SentimentLabel::Neutral);

        let reloaded = SentimentStore::load(store.path(), tokens(), 10).await;
        assert!(reloaded.snapshot().await.tokens.contains_key("PEPE"));
    }

    #[tokio::test]
    async fn test_state_survives_reload() {
        let (_dir, store) = store(10);
        store.ingest(message(1, "sell ETH")).await.unwrap();
        store.ingest(message(2, "dump eth")).await.unwrap();

        let reloaded = SentimentStore::load(store.path(), tokens(), 10).await;
        let eth = reloaded.get("ETH").await;
        assert_eq!(eth.sell_count, 2);
        assert_eq!(eth.label, SentimentLabel::Negative);
        assert_eq!(reloaded.messages().await.len(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentiment.json");
        tokio::fs::write(&path, "not json at all").await.unwrap();

        let store = SentimentStore::load(&path, tokens(), 10).await;
        assert!(store.snapshot().await.tokens.is_empty());
    }

    #[tokio::test]
    async fn test_synthetic_tick_seeds_then_grows() {
        let (_dir, store) = store(10);
        let fallback = DegradedMode::new("USDC");

        store.synthetic_tick(&fallback).await.unwrap();
        let first = store.snapshot().await;
        assert_eq!(first.tokens.len(), 2);
        assert!(first.tokens["ETH"].buy_count >= 5);

        store.synthetic_tick(&fallback).await.unwrap();
        let second = store.snapshot().await;
        for (token, before) in &first.tokens {
            let after = &second.tokens[token];
            assert!(after.buy_count >= before.buy_count);
            assert!(after.sell_count >= before.sell_count);
            assert!(after.neutral_count >= before.neutral_count);
        }
    }

    #[tokio::test]
    async fn test_clear_resets_counters() {
        let (_dir, store) = store(10);
        store.ingest(message(1, "btc bullish")).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.snapshot().await.tokens.is_empty());
        assert_eq!(store.messages().await.len(), 1);
    }
}
