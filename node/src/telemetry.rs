// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use std::sync::OnceLock;

pub const SUBMISSIONS_TOTAL: &str = "anchor_submissions_total";
pub const REPLAYS_TOTAL: &str = "anchor_replays_total";
pub const BINDING_MISMATCHES_TOTAL: &str = "anchor_binding_mismatches_total";
pub const VERIFICATIONS_TOTAL: &str = "anchor_verifications_total";
pub const SUBMIT_DURATION_SECONDS: &str = "anchor_submit_duration_seconds";

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the log subscriber only. Used by the CLI, which has no /metrics.
pub fn init_logging(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Initialize telemetry (logs + metrics)
pub fn init_telemetry() {
    init_logging("anchor_node=debug,tower_http=debug");

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if PROM_HANDLE.set(handle).is_err() {
                tracing::warn!("Prometheus handle already set. Telemetry re-initialized?");
            }
        }
        Err(e) => tracing::warn!("failed to install Prometheus recorder: {}", e),
    }

    metrics::describe_counter!(SUBMISSIONS_TOTAL, "Proofs appended and bound");
    metrics::describe_counter!(REPLAYS_TOTAL, "Submissions resolved to an existing binding");
    metrics::describe_counter!(BINDING_MISMATCHES_TOTAL, "Ledger reported hashes that differ from local ones");
    metrics::describe_counter!(VERIFICATIONS_TOTAL, "Triple-equality checks by result");
    metrics::describe_histogram!(SUBMIT_DURATION_SECONDS, "Time from build to reconciled binding");

    metrics::gauge!("anchor_node_up", 1.0);
}

/// Get the Prometheus handle to render metrics
pub fn get_metrics() -> String {
    if let Some(handle) = PROM_HANDLE.get() {
        handle.render()
    } else {
        "# metrics not initialized".to_string()
    }
}
