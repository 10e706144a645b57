// Metrics module - Prometheus metrics for the transform pipeline
//
// Registered once in the default registry and exported at GET /metrics:
// - kagami_requests_total{status}
// - kagami_stage_duration_seconds{stage}
// - kagami_defaulted_fields_total{field}
// - kagami_concurrency_rejections_total

use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::Stage;
use crate::options::DefaultedField;

/// Global metrics for image requests
pub struct TransformMetrics {
    /// Completed requests by HTTP status
    pub requests: IntCounterVec,

    /// Time spent per dispatch stage (in seconds)
    pub stage_duration: HistogramVec,

    /// Option fields that fell back to their default
    pub defaulted_fields: IntCounterVec,

    /// Requests turned away by the concurrency limit
    pub concurrency_rejections: IntCounter,
}

/// Global singleton instance of metrics
static METRICS: OnceLock<TransformMetrics> = OnceLock::new();

impl TransformMetrics {
    /// Initialize and return the global metrics instance
    ///
    /// Subsequent calls return the same instance.
    pub fn global() -> &'static Self {
        METRICS.get_or_init(|| {
            let requests = register_int_counter_vec!(
                "kagami_requests_total",
                "Total number of image requests by response status",
                &["status"]
            )
            .expect("Failed to register kagami_requests_total metric");

            let stage_duration = register_histogram_vec!(
                "kagami_stage_duration_seconds",
                "Duration of dispatch stages in seconds",
                &["stage"], // parse, fetch, process, encode
                vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
            )
            .expect("Failed to register kagami_stage_duration_seconds metric");

            let defaulted_fields = register_int_counter_vec!(
                "kagami_defaulted_fields_total",
                "Option fields left at their default because the token was absent or malformed",
                &["field"]
            )
            .expect("Failed to register kagami_defaulted_fields_total metric");

            let concurrency_rejections = register_int_counter!(
                "kagami_concurrency_rejections_total",
                "Requests rejected with 503 because max_concurrent_requests was reached"
            )
            .expect("Failed to register kagami_concurrency_rejections_total metric");

            Self {
                requests,
                stage_duration,
                defaulted_fields,
                concurrency_rejections,
            }
        })
    }

    pub fn record_request(&self, status: u16) {
        self.requests.with_label_values(&[&status.to_string()]).inc();
    }

    pub fn record_stage(&self, stage: Stage, duration: Duration) {
        self.stage_duration
            .with_label_values(&[stage.as_str()])
            .observe(duration.as_secs_f64());
    }

    pub fn record_defaulted(&self, fields: &[DefaultedField]) {
        for field in fields {
            self.defaulted_fields
                .with_label_values(&[field.as_str()])
                .inc();
        }
    }

    pub fn record_rejection(&self) {
        self.concurrency_rejections.inc();
    }

    pub fn request_count(&self, status: u16) -> u64 {
        self.requests.with_label_values(&[&status.to_string()]).get()
    }

    pub fn defaulted_count(&self, field: DefaultedField) -> u64 {
        self.defaulted_fields
            .with_label_values(&[field.as_str()])
            .get()
    }
}

/// Render every metric in the default registry in text exposition format.
pub fn export_prometheus() -> String {
    // Make sure our families exist even before the first request
    TransformMetrics::global();

    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&prometheus::gather(), &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
