//! Metrics collection for observability

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec_with_registry, register_counter_with_registry,
    register_gauge_with_registry, register_histogram_vec_with_registry, Counter, CounterVec,
    Gauge, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> =
    Lazy::new(|| Arc::new(Metrics::new().expect("Failed to initialize metrics")));

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Request metrics
    pub requests: CounterVec,
    pub request_duration: HistogramVec,

    // Pipeline metrics
    pub completion_retries: Counter,
    pub documents_processed: CounterVec,

    // Store metrics
    pub store_size: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let registry = Registry::new();

        let requests = register_counter_vec_with_registry!(
            Opts::new("factline_requests_total", "Total HTTP requests"),
            &["endpoint", "status"],
            registry
        )?;

        let request_duration = register_histogram_vec_with_registry!(
            "factline_request_duration_seconds",
            "HTTP request duration in seconds",
            &["endpoint"],
            registry
        )?;

        let completion_retries = register_counter_with_registry!(
            Opts::new(
                "factline_completion_retries_total",
                "Completion API calls retried after rate limiting or transport failure"
            ),
            registry
        )?;

        let documents_processed = register_counter_vec_with_registry!(
            Opts::new(
                "factline_documents_processed_total",
                "Documents and call-log batches processed"
            ),
            &["status"],
            registry
        )?;

        let store_size = register_gauge_with_registry!(
            Opts::new(
                "factline_store_entries",
                "Entries currently in the result store"
            ),
            registry
        )?;

        Ok(Self {
            registry,
            requests,
            request_duration,
            completion_retries,
            documents_processed,
            store_size,
        })
    }

    /// Record a handled request
    pub fn record_request(&self, endpoint: &str, ok: bool) {
        let status = if ok { "success" } else { "error" };
        self.requests.with_label_values(&[endpoint, status]).inc();
    }

    /// Render the registry in prometheus text exposition format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        encoder
            .encode_to_string(&self.registry.gather())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialize() {
        let metrics = Metrics::new().unwrap();
        metrics.record_request("get_question_and_facts", true);
        metrics.record_request("get_question_and_facts", false);
        metrics.completion_retries.inc();
        metrics.store_size.set(3.0);

        let rendered = metrics.render();
        assert!(rendered.contains("factline_requests_total"));
        assert!(rendered.contains("factline_completion_retries_total"));
    }
}
