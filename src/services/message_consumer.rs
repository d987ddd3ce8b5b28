use std::sync::Arc;

use metrics::counter;
use tokio::sync::mpsc;

use crate::db::SentimentStore;
use crate::models::ChatMessage;

/// Drain inbound chat messages into the sentiment store until the channel
/// closes. Returns how many messages were processed.
pub async fn run_message_consumer(
    mut rx: mpsc::Receiver<ChatMessage>,
    store: Arc<SentimentStore>,
) -> u64 {
    let mut processed = 0u64;

    while let Some(message) = rx.recv().await {
        counter!("sentiment_messages_total").increment(1);
        processed += 1;

        let channel = message.channel_name.clone();
        match store.ingest(message).await {
            Ok(tokens) if !tokens.is_empty() => {
                tracing::info!(channel = %channel, tokens = ?tokens, "Chat message moved sentiment");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, channel = %channel, "Failed to persist sentiment update");
            }
        }
    }

    tracing::warn!(processed, "Chat message channel closed");
    processed
}
