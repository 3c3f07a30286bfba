// Path: crates/telemetry/src/prometheus.rs
//! A concrete implementation of the metrics sinks using the Prometheus crate.

use crate::sinks::*;
use once_cell::sync::OnceCell;
use prometheus::{
    exponential_buckets, register_gauge, register_histogram, register_histogram_vec,
    register_int_counter, register_int_counter_vec, Gauge, Histogram, HistogramVec, IntCounter,
    IntCounterVec,
};

// --- Metric Statics ---
// We use OnceCell to hold the metric collectors. They will be initialized
// exactly once by the `install` function.

static STORAGE_DOCUMENT_READS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static STORAGE_DOCUMENT_WRITES_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static STORAGE_BYTES_WRITTEN_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static HTTP_REQUESTS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static HTTP_REQUEST_DURATION_SECONDS: OnceCell<HistogramVec> = OnceCell::new();
static ERRORS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static MODEL_TRAINING_RUNS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static MODEL_LAST_ACCURACY: OnceCell<Gauge> = OnceCell::new();
static MODEL_TRAINING_DURATION_SECONDS: OnceCell<Histogram> = OnceCell::new();
static MODEL_PREDICTIONS_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static AUTH_EVENTS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

#[derive(Debug, Clone, Copy)]
pub struct PrometheusSink;

static PROMETHEUS_SINK: PrometheusSink = PrometheusSink;

/// Fetches a collector, doing nothing when `install()` has not run.
/// Sinks are only reachable through `SINK` after a successful install, so the
/// `None` arm is never taken in practice.
macro_rules! with_metric {
    ($metric:ident, |$m:ident| $body:expr) => {
        if let Some($m) = $metric.get() {
            $body;
        }
    };
}

impl StorageMetricsSink for PrometheusSink {
    fn inc_document_reads(&self, collection: &str) {
        with_metric!(STORAGE_DOCUMENT_READS_TOTAL, |m| m
            .with_label_values(&[collection])
            .inc());
    }
    fn inc_document_writes(&self, collection: &str) {
        with_metric!(STORAGE_DOCUMENT_WRITES_TOTAL, |m| m
            .with_label_values(&[collection])
            .inc());
    }
    fn inc_bytes_written_total(&self, bytes: u64) {
        with_metric!(STORAGE_BYTES_WRITTEN_TOTAL, |m| m.inc_by(bytes));
    }
}

impl RpcMetricsSink for PrometheusSink {
    fn observe_request_duration(&self, route: &str, duration_secs: f64) {
        with_metric!(HTTP_REQUEST_DURATION_SECONDS, |m| m
            .with_label_values(&[route])
            .observe(duration_secs));
    }
    fn inc_requests_total(&self, route: &str, status_code: u16) {
        with_metric!(HTTP_REQUESTS_TOTAL, |m| m
            .with_label_values(&[route, &status_code.to_string()])
            .inc());
    }
}

impl ErrorMetricsSink for PrometheusSink {
    fn inc_error(&self, kind: &'static str, variant: &'static str) {
        with_metric!(ERRORS_TOTAL, |m| m.with_label_values(&[kind, variant]).inc());
    }
}

impl ModelMetricsSink for PrometheusSink {
    fn inc_training_runs(&self, result: &'static str) {
        with_metric!(MODEL_TRAINING_RUNS_TOTAL, |m| m
            .with_label_values(&[result])
            .inc());
    }
    fn set_last_accuracy(&self, accuracy: f64) {
        with_metric!(MODEL_LAST_ACCURACY, |m| m.set(accuracy));
    }
    fn observe_training_duration(&self, duration_secs: f64) {
        with_metric!(MODEL_TRAINING_DURATION_SECONDS, |m| m.observe(duration_secs));
    }
    fn inc_predictions(&self) {
        with_metric!(MODEL_PREDICTIONS_TOTAL, |m| m.inc());
    }
}

impl AuthMetricsSink for PrometheusSink {
    fn inc_auth_event(&self, event: &'static str, outcome: &'static str) {
        with_metric!(AUTH_EVENTS_TOTAL, |m| m
            .with_label_values(&[event, outcome])
            .inc());
    }
}

/// Stores a freshly registered collector. A second `install()` fails earlier,
/// at registration, with `AlreadyReg`, so `set` only ever sees empty cells.
fn store<T>(cell: &OnceCell<T>, value: T) {
    let _ = cell.set(value);
}

/// Initializes all Prometheus metrics collectors, publishes the sink through
/// [`SINK`], and returns a static reference to it.
///
/// Calling this a second time returns the already-installed sink.
pub fn install() -> Result<&'static dyn MetricsSink, prometheus::Error> {
    if let Some(sink) = SINK.get() {
        return Ok(*sink);
    }
    store(
        &STORAGE_DOCUMENT_READS_TOTAL,
        register_int_counter_vec!(
            "flora_storage_document_reads_total",
            "Total document reads, by collection.",
            &["collection"]
        )?,
    );
    store(
        &STORAGE_DOCUMENT_WRITES_TOTAL,
        register_int_counter_vec!(
            "flora_storage_document_writes_total",
            "Total whole-document writes, by collection.",
            &["collection"]
        )?,
    );
    store(
        &STORAGE_BYTES_WRITTEN_TOTAL,
        register_int_counter!(
            "flora_storage_bytes_written_total",
            "Total encoded bytes written to the document backend."
        )?,
    );
    store(
        &HTTP_REQUESTS_TOTAL,
        register_int_counter_vec!(
            "flora_http_requests_total",
            "Total HTTP requests.",
            &["route", "status"]
        )?,
    );
    store(
        &HTTP_REQUEST_DURATION_SECONDS,
        register_histogram_vec!(
            "flora_http_request_duration_seconds",
            "Latency of HTTP requests.",
            &["route"],
            exponential_buckets(0.001, 2.0, 15)?
        )?,
    );
    store(
        &ERRORS_TOTAL,
        register_int_counter_vec!(
            "flora_errors_total",
            "Total number of errors, categorized by type and variant.",
            &["kind", "variant"]
        )?,
    );
    store(
        &MODEL_TRAINING_RUNS_TOTAL,
        register_int_counter_vec!(
            "flora_model_training_runs_total",
            "Total training runs, by result.",
            &["result"]
        )?,
    );
    store(
        &MODEL_LAST_ACCURACY,
        register_gauge!(
            "flora_model_last_accuracy",
            "Held-out accuracy of the most recently trained model."
        )?,
    );
    store(
        &MODEL_TRAINING_DURATION_SECONDS,
        register_histogram!(
            "flora_model_training_duration_seconds",
            "Wall-clock duration of a training run.",
            exponential_buckets(0.005, 2.0, 14)?
        )?,
    );
    store(
        &MODEL_PREDICTIONS_TOTAL,
        register_int_counter!(
            "flora_model_predictions_total",
            "Total predictions served."
        )?,
    );
    store(
        &AUTH_EVENTS_TOTAL,
        register_int_counter_vec!(
            "flora_auth_events_total",
            "Authentication events, by event and outcome.",
            &["event", "outcome"]
        )?,
    );

    let sink: &'static dyn MetricsSink = &PROMETHEUS_SINK;
    let _ = SINK.set(sink);
    Ok(sink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_is_idempotent_and_records() {
        let first = install().unwrap();
        let second = install().unwrap();
        assert!(std::ptr::eq(
            first as *const dyn MetricsSink as *const u8,
            second as *const dyn MetricsSink as *const u8
        ));

        first.inc_training_runs("ok");
        first.set_last_accuracy(0.9);
        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "flora_model_training_runs_total"));
    }
}
