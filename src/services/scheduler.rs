use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use crate::db::StoreError;

#[derive(Debug, Error)]
pub enum TickError {
    #[error("persistence failed: {0}")]
    Persistence(#[from] StoreError),

    #[error("{0}")]
    Other(String),
}

/// A unit of periodic work whose every run yields an explicit result.
#[async_trait]
pub trait PeriodicTask: Send {
    type Report: fmt::Debug + Send;

    fn name(&self) -> &'static str;

    async fn tick(&mut self) -> Result<Self::Report, TickError>;
}

/// When the first tick fires relative to startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstTick {
    Immediately,
    AfterPeriod,
}

/// Drive `task` every `period` until `shutdown` flips to `true`.
///
/// Each tick is awaited to completion before the next one can start, and a
/// slow tick delays the schedule rather than bunching up missed ticks.
/// Failures are logged and the loop carries on. Returns the number of ticks run.
pub async fn run_periodic<T: PeriodicTask>(
    mut task: T,
    period: Duration,
    first: FirstTick,
    mut shutdown: watch::Receiver<bool>,
) -> u64 {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    if first == FirstTick::AfterPeriod {
        ticker.tick().await; // consume the first immediate tick
    }

    tracing::info!(task = task.name(), period_secs = period.as_secs(), "Periodic task started");

    let mut ticks = 0u64;
    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        ticks += 1;
        match task.tick().await {
            Ok(report) => {
                tracing::debug!(task = task.name(), tick = ticks, report = ?report, "Tick completed");
            }
            Err(e) => {
                tracing::error!(task = task.name(), tick = ticks, error = %e, "Tick failed");
            }
        }
    }

    tracing::info!(task = task.name(), ticks, "Periodic task stopped");
    ticks
}
