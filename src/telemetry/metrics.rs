//! Prometheus metrics

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on the given port
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;

    tracing::info!(port, "metrics exporter listening");
    Ok(())
}

/// Number of symbols with an active exit config
pub fn record_active_stops(count: usize) {
    metrics::gauge!("sentinel_active_stops").set(count as f64);
}

/// An automatic exit order was submitted
pub fn record_exit_triggered() {
    metrics::counter!("sentinel_exits_triggered_total").increment(1);
}

/// A stop poll tick failed before completing
pub fn record_tick_error() {
    metrics::counter!("sentinel_stop_tick_errors_total").increment(1);
}
