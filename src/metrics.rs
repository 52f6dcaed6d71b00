//! Metrics and observability utilities
//!
//! Prometheus metrics via the metrics-rs recorder, exposed on GET /metrics.

use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Metrics prefix for all Deckcheck metrics
pub const METRICS_PREFIX: &str = "deckcheck";

/// Buckets for pipeline latency (dominated by model calls, typically seconds)
pub const PIPELINE_BUCKETS: &[f64] = &[
    0.500, //  500ms
    1.000, //  1s
    2.500, //  2.5s
    5.000, //  5s
    10.00, // 10s
    30.00, // 30s
    60.00, // 1m
    120.0, // 2m
    300.0, // 5m
];

/// Install the Prometheus recorder and return the render handle.
pub fn setup_recorder() -> Result<PrometheusHandle, anyhow::Error> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            metrics_exporter_prometheus::Matcher::Full(format!(
                "{}_pipeline_duration_seconds",
                METRICS_PREFIX
            )),
            PIPELINE_BUCKETS,
        )?
        .install_recorder()?;
    Ok(handle)
}

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_pipeline_runs_total", METRICS_PREFIX),
        Unit::Count,
        "Total verification pipeline runs"
    );

    describe_histogram!(
        format!("{}_pipeline_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "End-to-end pipeline latency in seconds"
    );

    describe_counter!(
        format!("{}_claims_extracted_total", METRICS_PREFIX),
        Unit::Count,
        "Total claims extracted from pitch decks"
    );

    describe_counter!(
        format!("{}_claims_verified_total", METRICS_PREFIX),
        Unit::Count,
        "Total claims verified against research"
    );

    describe_counter!(
        format!("{}_questions_generated_total", METRICS_PREFIX),
        Unit::Count,
        "Total due-diligence questions generated"
    );

    describe_counter!(
        format!("{}_reports_emailed_total", METRICS_PREFIX),
        Unit::Count,
        "Total analysis reports delivered over email"
    );
}
