//! Prometheus metrics for debt-ledger-service.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

use crate::ledger::EntryKind;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Later calls are no-ops.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_some() {
        return;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if METRICS_HANDLE.set(handle).is_err() {
                tracing::debug!("Metrics handle already set");
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Prometheus recorder not installed; metrics disabled");
            return;
        }
    }

    describe_counter!("http_requests_total", "HTTP requests by method, path and status");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request latency by method and path"
    );
    describe_counter!(
        "ledger_transactions_written_total",
        "Transactions recorded, by canonical type"
    );
    describe_counter!(
        "ledger_unrecognized_type_total",
        "Rows whose type tag was not in the alias table"
    );
    describe_histogram!(
        "ledger_store_query_duration_seconds",
        "Store call latency by operation"
    );
}

/// Metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

pub fn record_transaction_written(kind: EntryKind) {
    counter!("ledger_transactions_written_total", "type" => kind.as_str()).increment(1);
}

pub fn record_store_call(operation: &'static str, started: Instant) {
    histogram!("ledger_store_query_duration_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());
}
