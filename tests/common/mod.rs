use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use whaletrack::api::router::create_router;
use whaletrack::config::{AppConfig, WatchedWhale};
use whaletrack::db::{SentimentStore, WhaleStore};
use whaletrack::moralis::{FetchError, RawTransfer, TransferQuery, TransferSource};
use whaletrack::services::{TrackedToken, WhaleTracker};
use whaletrack::AppState;

#[allow(dead_code)]
pub const WHALE: &str = "0x2Df1c51E09aECF9cacB7bc98cB1742757f163dF7";

/// Returns the same transfers for every address.
pub struct FixedSource(pub Vec<RawTransfer>);

#[async_trait]
impl TransferSource for FixedSource {
    async fn fetch_transfers(&self, _query: &TransferQuery) -> Result<Vec<RawTransfer>, FetchError> {
        Ok(self.0.clone())
    }
}

/// Fails for the listed addresses, otherwise behaves like `FixedSource`.
#[allow(dead_code)]
pub struct FlakySource {
    pub failing: HashSet<String>,
    pub transfers: Vec<RawTransfer>,
}

#[async_trait]
impl TransferSource for FlakySource {
    async fn fetch_transfers(&self, query: &TransferQuery) -> Result<Vec<RawTransfer>, FetchError> {
        if self.failing.contains(&query.address) {
            return Err(FetchError::Unexpected("upstream unavailable".into()));
        }
        Ok(self.transfers.clone())
    }
}

/// Never answers within any sane timeout.
#[allow(dead_code)]
pub struct StalledSource;

#[async_trait]
impl TransferSource for StalledSource {
    async fn fetch_transfers(&self, _query: &TransferQuery) -> Result<Vec<RawTransfer>, FetchError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }
}

/// A raw 6-decimal USDC transfer.
#[allow(dead_code)]
pub fn usdc_transfer(from: &str, to: &str, raw_value: &str, hash: &str) -> RawTransfer {
    RawTransfer {
        from_address: Some(from.into()),
        to_address: Some(to.into()),
        value: Some(raw_value.into()),
        token_decimals: Some(6),
        block_timestamp: Some("2024-03-01T12:00:00.000Z".into()),
        transaction_hash: Some(hash.into()),
        token_symbol: Some("USDC".into()),
    }
}

pub fn test_config(data_dir: &Path) -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        data_dir: data_dir.to_path_buf(),
        moralis_api_key: None,
        moralis_base_url: None,
        fetch_limit: 30,
        fetch_timeout_secs: 1,
        token_contract: "0xaf88d065e77c8cC2239327C5EDb3A432268e5831".into(),
        token_symbol: "USDC".into(),
        token_decimals: 6,
        chain: "0xa4b1".into(),
        default_whale_address: WHALE.into(),
        default_threshold: Decimal::from(1_000_000),
        watched_whales: vec![WatchedWhale {
            address: WHALE.into(),
            threshold: Decimal::from(1_000_000),
        }],
        whale_poll_interval_secs: 300,
        sentiment_tokens: vec!["ETH".into(), "BTC".into(), "ARB".into()],
        sentiment_tick_interval_secs: 30,
        message_window: 10,
        telegram_bot_token: None,
    }
}

#[allow(dead_code)]
pub fn build_tracker(
    data_dir: &Path,
    source: Arc<dyn TransferSource>,
    fetch_timeout: Duration,
) -> Arc<WhaleTracker> {
    let store = Arc::new(WhaleStore::new(data_dir.join("whale_transactions.json")));
    Arc::new(WhaleTracker::new(
        source,
        store,
        TrackedToken {
            symbol: "USDC".into(),
            contract: "0xaf88d065e77c8cC2239327C5EDb3A432268e5831".into(),
            chain: "0xa4b1".into(),
            decimals: 6,
        },
        30,
        fetch_timeout,
    ))
}

/// Router over a fresh data directory. Keep the `TempDir` alive for the
/// duration of the test.
#[allow(dead_code)]
pub fn build_test_app(source: Arc<dyn TransferSource>) -> (axum::Router, AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    let tracker = build_tracker(dir.path(), source, config.fetch_timeout());
    let sentiment = Arc::new(SentimentStore::new(
        dir.path().join("sentiment_data.json"),
        config.sentiment_tokens.clone(),
        config.message_window,
    ));

    let state = AppState::new(config, tracker, sentiment, whaletrack::metrics::detached_handle());
    (create_router(state.clone()), state, dir)
}
