//! Prometheus metrics collection for Pentamind
//!
//! This module provides metrics instrumentation for tracking:
//! - Pipeline runs by task and outcome
//! - Per-stage latency
//! - Backend calls by backend and outcome
//! - Fallback and search usage
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.
//! Recording failures are returned to the caller, which logs them; they never
//! fail a run.

use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntCounter, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics collector for Pentamind
///
/// Cheap to clone: all handles share one registry.
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    runs_total: CounterVec,
    stage_duration: HistogramVec,
    backend_calls: CounterVec,
    fallbacks_total: IntCounter,
    search_total: CounterVec,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// Registers all metrics with a new Prometheus registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: 5 tasks × 3 outcomes (verified, fallback, no_result)
        let runs_total = CounterVec::new(
            Opts::new(
                "pentamind_runs_total",
                "Total number of pipeline runs by task and outcome",
            ),
            &["task", "outcome"],
        )?;

        let stage_duration = HistogramVec::new(
            HistogramOpts::new(
                "pentamind_stage_duration_ms",
                "Pipeline stage latency in milliseconds",
            )
            .buckets(vec![
                0.1, 1.0, 10.0, 100.0, 500.0, 1000.0, 5000.0, 15000.0, 30000.0, 60000.0, 90000.0,
            ]),
            &["stage"],
        )?;

        // Backend ids come from configuration, outcomes from ProviderError::kind()
        let backend_calls = CounterVec::new(
            Opts::new(
                "pentamind_backend_calls_total",
                "Total backend calls by backend and outcome",
            ),
            &["backend", "outcome"],
        )?;

        let fallbacks_total = IntCounter::with_opts(Opts::new(
            "pentamind_fallbacks_total",
            "Total number of Fallback stage invocations",
        ))?;

        // Outcomes: augmented, empty, failed, unavailable
        let search_total = CounterVec::new(
            Opts::new(
                "pentamind_search_total",
                "Total search augmentation attempts by outcome",
            ),
            &["outcome"],
        )?;

        registry.register(Box::new(runs_total.clone()))?;
        registry.register(Box::new(stage_duration.clone()))?;
        registry.register(Box::new(backend_calls.clone()))?;
        registry.register(Box::new(fallbacks_total.clone()))?;
        registry.register(Box::new(search_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            runs_total,
            stage_duration,
            backend_calls,
            fallbacks_total,
            search_total,
        })
    }

    /// Record a completed run
    ///
    /// # Errors
    ///
    /// Returns an error if the label set does not match the metric.
    pub fn record_run(&self, task: &str, outcome: &str) -> Result<(), prometheus::Error> {
        self.runs_total
            .get_metric_with_label_values(&[task, outcome])?
            .inc();
        Ok(())
    }

    /// Record how long a stage took
    ///
    /// # Errors
    ///
    /// Returns an error if `duration_ms` is NaN, infinite or negative. Such
    /// values would corrupt every percentile of the histogram.
    pub fn record_stage_duration(
        &self,
        stage: &str,
        duration_ms: f64,
    ) -> Result<(), prometheus::Error> {
        if !duration_ms.is_finite() {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be finite (not NaN or Infinity), got: {}",
                duration_ms
            )));
        }
        if duration_ms < 0.0 {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be non-negative, got: {}",
                duration_ms
            )));
        }

        self.stage_duration
            .get_metric_with_label_values(&[stage])?
            .observe(duration_ms);
        Ok(())
    }

    /// Record one backend call
    pub fn record_backend_call(&self, backend: &str, outcome: &str) -> Result<(), prometheus::Error> {
        self.backend_calls
            .get_metric_with_label_values(&[backend, outcome])?
            .inc();
        Ok(())
    }

    /// Record a Fallback stage invocation
    pub fn record_fallback(&self) -> Result<(), prometheus::Error> {
        self.fallbacks_total.inc();
        Ok(())
    }

    /// Record a search attempt
    pub fn record_search(&self, outcome: &str) -> Result<(), prometheus::Error> {
        self.search_total
            .get_metric_with_label_values(&[outcome])?
            .inc();
        Ok(())
    }

    /// Number of Fallback stage invocations since startup
    pub fn fallbacks_count(&self) -> u64 {
        self.fallbacks_total.get()
    }

    /// Gather all metrics and encode them in Prometheus text format
    ///
    /// # Errors
    ///
    /// Returns an error if metric encoding fails.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();
        let metric_count = metric_families.len();

        tracing::debug!(
            metric_family_count = metric_count,
            "Encoding metrics to Prometheus text format"
        );

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    metric_family_count = metric_count,
                    "Prometheus text encoder failed"
                );
                prometheus::Error::Msg(format!(
                    "Failed to encode {} metric families: {}",
                    metric_count, e
                ))
            })?;

        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!(
                "Failed to convert metrics to UTF-8 at byte {}: {}",
                e.utf8_error().valid_up_to(),
                e
            ))
        })
    }
}
