use std::sync::Arc;

use async_trait::async_trait;
use metrics::{counter, gauge};

use crate::config::WatchedWhale;
use crate::services::scheduler::{PeriodicTask, TickError};
use crate::services::whale_tracker::{DataSource, WhaleTracker};

/// What happened to one address during a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressStatus {
    Live { buys: usize, sells: usize },
    /// Upstream failed and synthetic transactions were stored instead.
    Degraded { reason: String },
    /// The report was built but could not be written.
    PersistFailed { reason: String },
}

#[derive(Debug, Clone)]
pub struct AddressOutcome {
    pub address: String,
    pub status: AddressStatus,
}

/// Per-address results of one poll over the watch list.
#[derive(Debug, Clone, Default)]
pub struct PollReport {
    pub outcomes: Vec<AddressOutcome>,
}

impl PollReport {
    pub fn live_count(&self) -> usize {
        self.count(|s| matches!(s, AddressStatus::Live { .. }))
    }

    pub fn degraded_count(&self) -> usize {
        self.count(|s| matches!(s, AddressStatus::Degraded { .. }))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|s| matches!(s, AddressStatus::PersistFailed { .. }))
    }

    fn count(&self, pred: impl Fn(&AddressStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Polls every watched whale in turn. One address failing never stops the
/// rest of the list.
pub struct WhalePoller {
    tracker: Arc<WhaleTracker>,
    whales: Vec<WatchedWhale>,
}

impl WhalePoller {
    pub fn new(tracker: Arc<WhaleTracker>, whales: Vec<WatchedWhale>) -> Self {
        Self { tracker, whales }
    }

    pub async fn poll_once(&self) -> PollReport {
        tracing::info!(whale_count = self.whales.len(), "Polling watched whales");

        let mut report = PollReport::default();

        for whale in &self.whales {
            let outcome = self.tracker.track(&whale.address, whale.threshold).await;
            counter!("whale_polls_total").increment(1);

            let status = match (&outcome.persisted, &outcome.source) {
                (Err(reason), _) => AddressStatus::PersistFailed {
                    reason: reason.clone(),
                },
                (Ok(()), DataSource::Degraded(reason)) => AddressStatus::Degraded {
                    reason: reason.clone(),
                },
                (Ok(()), DataSource::Live) => AddressStatus::Live {
                    buys: outcome.report.buy_count,
                    sells: outcome.report.sell_count,
                },
            };

            report.outcomes.push(AddressOutcome {
                address: whale.address.clone(),
                status,
            });
        }

        let tracked = self.tracker.store().list().await.len();
        gauge!("tracked_whales").set(tracked as f64);

        tracing::info!(
            live = report.live_count(),
            degraded = report.degraded_count(),
            failed = report.failed_count(),
            "Whale poll cycle finished"
        );

        report
    }
}

#[async_trait]
impl PeriodicTask for WhalePoller {
    type Report = PollReport;

    fn name(&self) -> &'static str {
        "whale_poller"
    }

    async fn tick(&mut self) -> Result<PollReport, TickError> {
        let report = self.poll_once().await;
        if !report.outcomes.is_empty() && report.failed_count() == report.outcomes.len() {
            return Err(TickError::Other(format!(
                "no snapshot could be saved for any of {} whales",
                report.outcomes.len()
            )));
        }
        Ok(report)
    }
}
