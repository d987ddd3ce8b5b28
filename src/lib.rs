pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod intelligence;
pub mod metrics;
pub mod models;
pub mod moralis;
pub mod services;

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::AppConfig;
use crate::db::{SentimentStore, WhaleStore};
use crate::services::WhaleTracker;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub tracker: Arc<WhaleTracker>,
    /// Same store the tracker writes to.
    pub whales: Arc<WhaleStore>,
    pub sentiment: Arc<SentimentStore>,
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        tracker: Arc<WhaleTracker>,
        sentiment: Arc<SentimentStore>,
        metrics_handle: PrometheusHandle,
    ) -> Self {
        Self {
            whales: tracker.store().clone(),
            config,
            tracker,
            sentiment,
            metrics_handle,
        }
    }
}
