use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;

use crate::db::SentimentStore;
use crate::services::fallback::DegradedMode;
use crate::services::scheduler::{PeriodicTask, TickError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentimentTick {
    /// Synthetic data was applied to these tokens.
    Synthetic { tokens: Vec<String> },
    /// A live message source is connected; nothing synthesized.
    LiveSource,
}

/// Keeps the sentiment table populated while no chat source is feeding it.
pub struct SentimentTicker {
    store: Arc<SentimentStore>,
    fallback: DegradedMode,
    live_source: Arc<AtomicBool>,
}

impl SentimentTicker {
    pub fn new(store: Arc<SentimentStore>, fallback: DegradedMode, live_source: Arc<AtomicBool>) -> Self {
        Self {
            store,
            fallback,
            live_source,
        }
    }
}

#[async_trait]
impl PeriodicTask for SentimentTicker {
    type Report = SentimentTick;

    fn name(&self) -> &'static str {
        "sentiment_ticker"
    }

    async fn tick(&mut self) -> Result<SentimentTick, TickError> {
        if self.live_source.load(Ordering::Relaxed) {
            return Ok(SentimentTick::LiveSource);
        }

        let tokens = self.store.synthetic_tick(&self.fallback).await?;
        counter!("synthetic_sentiment_ticks").increment(1);
        tracing::debug!(tokens = tokens.len(), "Synthetic sentiment update applied");

        Ok(SentimentTick::Synthetic { tokens })
    }
}
