//! Metrics collection for observability

use prometheus::{
    Counter, CounterVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_vec_with_registry, register_histogram_with_registry,
};
use std::sync::Arc;
use once_cell::sync::Lazy;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Query pipeline metrics
    pub query_requests: CounterVec,
    pub stage_duration: HistogramVec,
    pub expanded_queries: Histogram,
    pub retrieved_facts: Histogram,

    // Citation metrics
    pub citations: Counter,
    pub reference_checks: CounterVec,

    // Provider metrics
    pub provider_requests: CounterVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let registry = Registry::new();

        let query_requests = register_counter_vec_with_registry!(
            Opts::new("study_query_requests_total", "Total answered queries"),
            &["status"],
            registry
        )?;

        let stage_duration = register_histogram_vec_with_registry!(
            "study_stage_duration_seconds",
            "Pipeline stage duration in seconds",
            &["stage"],
            registry
        )?;

        let expanded_queries = register_histogram_with_registry!(
            HistogramOpts::new("study_expanded_queries", "Expanded queries per request")
                .buckets(vec![1.0, 2.0, 4.0, 8.0, 11.0, 16.0, 32.0]),
            registry
        )?;

        let retrieved_facts = register_histogram_with_registry!(
            HistogramOpts::new("study_retrieved_facts", "Candidate facts per request")
                .buckets(vec![0.0, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
            registry
        )?;

        let citations = register_counter_with_registry!(
            Opts::new("study_citations_total", "Total citations returned"),
            registry
        )?;

        let reference_checks = register_counter_vec_with_registry!(
            Opts::new("study_reference_checks_total", "Citation references by verification outcome"),
            &["outcome"],
            registry
        )?;

        let provider_requests = register_counter_vec_with_registry!(
            Opts::new("study_provider_requests_total", "Provider calls by kind and status"),
            &["kind", "status"],
            registry
        )?;

        Ok(Self {
            registry,
            query_requests,
            stage_duration,
            expanded_queries,
            retrieved_facts,
            citations,
            reference_checks,
            provider_requests,
        })
    }

    /// Record the outcome of one query; `status` is "success" or an error code
    pub fn record_query(&self, status: &str) {
        self.query_requests.with_label_values(&[status]).inc();
    }

    pub fn record_stage(&self, stage: &str, seconds: f64) {
        self.stage_duration.with_label_values(&[stage]).observe(seconds);
    }

    pub fn record_retrieval(&self, expanded: usize, retrieved: usize) {
        self.expanded_queries.observe(expanded as f64);
        self.retrieved_facts.observe(retrieved as f64);
    }

    pub fn record_verification(&self, citations: usize, verified: usize, missing: usize) {
        self.citations.inc_by(citations as f64);
        self.reference_checks
            .with_label_values(&["exists"])
            .inc_by(verified as f64);
        self.reference_checks
            .with_label_values(&["missing"])
            .inc_by(missing as f64);
    }

    pub fn record_provider(&self, kind: &str, success: bool) {
        let status = if success { "success" } else { "error" };
        self.provider_requests.with_label_values(&[kind, status]).inc();
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        if encoder.encode(&metric_families, &mut buffer).is_err() {
            return String::new();
        }

        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Time an expression into the `stage_duration` histogram
#[macro_export]
macro_rules! time_stage {
    ($stage:expr, $operation:expr) => {{
        let start = std::time::Instant::now();
        let result = $operation;
        $crate::metrics::METRICS.record_stage($stage, start.elapsed().as_secs_f64());
        result
    }};
}
