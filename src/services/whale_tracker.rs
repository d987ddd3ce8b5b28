use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use metrics::{counter, histogram};
use rust_decimal::Decimal;

use crate::db::WhaleStore;
use crate::intelligence::{aggregate, classify_batch, filter_by_threshold, ClassifyContext, WhaleReport};
use crate::models::WhaleSnapshot;
use crate::moralis::{FetchError, RawTransfer, TransferQuery, TransferSource};
use crate::services::fallback::DegradedMode;

/// Token and chain the tracker watches.
#[derive(Debug, Clone)]
pub struct TrackedToken {
    pub symbol: String,
    pub contract: String,
    pub chain: String,
    pub decimals: u32,
}

/// Where the transactions in a report came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Live,
    /// Upstream failed; the report holds synthetic transactions.
    Degraded(String),
}

/// Result of one tracking run for one address.
#[derive(Debug, Clone)]
pub struct TrackOutcome {
    pub report: WhaleReport,
    pub snapshot: WhaleSnapshot,
    pub source: DataSource,
    /// `Err` carries the persistence failure; the report is still valid.
    pub persisted: Result<(), String>,
}

impl TrackOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self.source, DataSource::Degraded(_))
    }
}

/// Runs fetch -> classify -> filter -> aggregate -> store for one address.
pub struct WhaleTracker {
    source: Arc<dyn TransferSource>,
    store: Arc<WhaleStore>,
    fallback: DegradedMode,
    token: TrackedToken,
    fetch_limit: u32,
    fetch_timeout: Duration,
}

impl WhaleTracker {
    pub fn new(
        source: Arc<dyn TransferSource>,
        store: Arc<WhaleStore>,
        token: TrackedToken,
        fetch_limit: u32,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            store,
            fallback: DegradedMode::new(token.symbol.clone()),
            token,
            fetch_limit,
            fetch_timeout,
        }
    }

    pub fn store(&self) -> &Arc<WhaleStore> {
        &self.store
    }

    pub fn fallback(&self) -> &DegradedMode {
        &self.fallback
    }

    /// Track one address. Never fails: fetch errors switch to synthetic data
    /// and storage errors are reported in the outcome.
    pub async fn track(&self, address: &str, threshold: Decimal) -> TrackOutcome {
        let start = Instant::now();

        tracing::info!(
            address = %address,
            threshold = %threshold,
            token = %self.token.symbol,
            "Tracking whale transfers"
        );

        let (report, source) = match self.fetch(address).await {
            Ok(transfers) => {
                tracing::info!(
                    address = %address,
                    count = transfers.len(),
                    "Retrieved token transfers"
                );
                let ctx = ClassifyContext::new(self.token.symbol.clone(), self.token.decimals);
                let classified = classify_batch(&transfers, address, &ctx);
                let mut significant = filter_by_threshold(classified, threshold);
                // Snapshots are newest first whatever order the source used
                significant.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                (aggregate(significant, threshold, &self.token.symbol), DataSource::Live)
            }
            Err(e) => {
                counter!("upstream_fetch_failures_total").increment(1);
                tracing::warn!(
                    error = %e,
                    address = %address,
                    "Transfer fetch failed, using mock data"
                );
                (self.fallback.mock_report(threshold), DataSource::Degraded(e.to_string()))
            }
        };

        let snapshot = WhaleSnapshot {
            whale_address: address.to_string(),
            transactions: report.transactions.clone(),
            summary: report.summary.clone(),
            last_updated: Utc::now(),
        };

        let persisted = match self.store.upsert(snapshot.clone()).await {
            Ok(()) => {
                counter!("whale_snapshots_written").increment(1);
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, address = %address, "Failed to save whale snapshot");
                Err(e.to_string())
            }
        };

        histogram!("whale_pipeline_latency_seconds").record(start.elapsed().as_secs_f64());

        tracing::info!(
            address = %address,
            buys = report.buy_count,
            sells = report.sell_count,
            degraded = matches!(source, DataSource::Degraded(_)),
            "{}",
            report.summary
        );

        TrackOutcome {
            report,
            snapshot,
            source,
            persisted,
        }
    }

    async fn fetch(&self, address: &str) -> Result<Vec<RawTransfer>, FetchError> {
        let query = TransferQuery {
            address: address.to_string(),
            token_contract: self.token.contract.clone(),
            chain: self.token.chain.clone(),
            limit: self.fetch_limit,
        };

        match tokio::time::timeout(self.fetch_timeout, self.source.fetch_transfers(&query)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.fetch_timeout)),
        }
    }
}
