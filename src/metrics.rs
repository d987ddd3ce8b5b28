use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    // Pre-register counters so they appear even before the first increment.
    counter!("whale_polls_total").absolute(0);
    counter!("upstream_fetch_failures_total").absolute(0);
    counter!("whale_snapshots_written").absolute(0);
    counter!("sentiment_messages_total").absolute(0);
    counter!("synthetic_sentiment_ticks").absolute(0);

    gauge!("tracked_whales").set(0.0);

    // Histogram is lazily created on first record; force creation.
    histogram!("whale_pipeline_latency_seconds").record(0.0);

    Ok(handle)
}

/// A handle backed by a recorder that is not installed globally. Useful when
/// several routers are built in one process, as in tests.
pub fn detached_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}
