// Path: crates/telemetry/src/sinks.rs
//! Defines abstract traits for metrics reporting, decoupling core logic from the backend.

use once_cell::sync::OnceCell;

// --- Static Sink Access ---

/// A no-op sink for use in tests or when telemetry is disabled.
#[derive(Debug, Clone, Copy)]
pub struct NopSink;

/// A lazily-initialized static reference to the global `MetricsSink` implementation.
pub static SINK: OnceCell<&'static dyn MetricsSink> = OnceCell::new();
static NOP_SINK: NopSink = NopSink;

/// Returns a static reference to the configured error metrics sink.
/// If no sink has been initialized, it returns a no-op sink.
pub fn error_metrics() -> &'static dyn ErrorMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns a static reference to the configured HTTP metrics sink.
pub fn rpc_metrics() -> &'static dyn RpcMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns a static reference to the configured storage metrics sink.
pub fn storage_metrics() -> &'static dyn StorageMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns a static reference to the configured model pipeline metrics sink.
pub fn model_metrics() -> &'static dyn ModelMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns a static reference to the configured authentication metrics sink.
pub fn auth_metrics() -> &'static dyn AuthMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

// --- Trait Definitions ---

/// A sink for metrics related to the document store.
pub trait StorageMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments the number of document reads, labeled by collection.
    fn inc_document_reads(&self, collection: &str);
    /// Increments the number of whole-document writes, labeled by collection.
    fn inc_document_writes(&self, collection: &str);
    /// Increments the total number of encoded bytes written to the backend.
    fn inc_bytes_written_total(&self, bytes: u64);
}
impl StorageMetricsSink for NopSink {
    fn inc_document_reads(&self, _collection: &str) {}
    fn inc_document_writes(&self, _collection: &str) {}
    fn inc_bytes_written_total(&self, _bytes: u64) {}
}

/// A sink for metrics related to the public HTTP server.
pub trait RpcMetricsSink: Send + Sync + std::fmt::Debug {
    /// Observes the latency of a request, labeled by route.
    fn observe_request_duration(&self, route: &str, duration_secs: f64);
    /// Increments a counter for total requests, labeled by route and status code.
    fn inc_requests_total(&self, route: &str, status_code: u16);
}
impl RpcMetricsSink for NopSink {
    fn observe_request_duration(&self, _route: &str, _duration_secs: f64) {}
    fn inc_requests_total(&self, _route: &str, _status_code: u16) {}
}

/// A sink for recording structured error metrics.
pub trait ErrorMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter for a specific error, categorized by its kind and variant.
    fn inc_error(&self, kind: &'static str, variant: &'static str);
}
impl ErrorMetricsSink for NopSink {
    fn inc_error(&self, _kind: &'static str, _variant: &'static str) {}
}

/// A sink for the training and prediction pipeline.
pub trait ModelMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments the number of training runs, labeled by result (`ok` / `error`).
    fn inc_training_runs(&self, result: &'static str);
    /// Sets the gauge holding the held-out accuracy of the latest model.
    fn set_last_accuracy(&self, accuracy: f64);
    /// Observes the wall-clock duration of one training run.
    fn observe_training_duration(&self, duration_secs: f64);
    /// Increments the number of served predictions.
    fn inc_predictions(&self);
}
impl ModelMetricsSink for NopSink {
    fn inc_training_runs(&self, _result: &'static str) {}
    fn set_last_accuracy(&self, _accuracy: f64) {}
    fn observe_training_duration(&self, _duration_secs: f64) {}
    fn inc_predictions(&self) {}
}

/// A sink for the authentication gateway.
pub trait AuthMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter of auth events (`register`, `login`, `admin_check`)
    /// labeled by outcome.
    fn inc_auth_event(&self, event: &'static str, outcome: &'static str);
}
impl AuthMetricsSink for NopSink {
    fn inc_auth_event(&self, _event: &'static str, _outcome: &'static str) {}
}

/// A unified sink that implements all domain-specific traits, providing a single
/// point of implementation for metrics backends like Prometheus.
pub trait MetricsSink:
    StorageMetricsSink + RpcMetricsSink + ErrorMetricsSink + ModelMetricsSink + AuthMetricsSink
{
}

// Blanket implementation to allow any type that implements all sub-traits
// to be used as a `MetricsSink`.
impl<T> MetricsSink for T where
    T: StorageMetricsSink + RpcMetricsSink + ErrorMetricsSink + ModelMetricsSink + AuthMetricsSink
{
}
