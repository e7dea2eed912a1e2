//! Metrics collection with Prometheus
//!
//! This module provides Prometheus metrics for the gateway:
//! - Forwarded request counts (by upstream, method and status)
//! - Forward failures (by upstream and failure kind)
//! - Upstream latency histogram
//! - Migration decisions (by chosen target)
//! - Requests that matched no route

use prometheus::{Counter, CounterVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Metrics collector for the gateway
#[derive(Clone)]
pub struct Metrics {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Requests forwarded to an upstream that produced a response
    pub requests_total: CounterVec,
    /// Requests that failed before an upstream response was obtained
    pub requests_failure: CounterVec,
    /// Time spent waiting for upstream response headers
    pub upstream_duration_seconds: HistogramVec,
    /// Distributor decisions for the migration-controlled route
    pub migration_decisions_total: CounterVec,
    /// Requests that matched no configured prefix
    pub unmatched_requests_total: Counter,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new(
                "strangler_proxy_requests_total",
                "Total number of requests answered by an upstream",
            ),
            &["upstream", "method", "status"],
        )?;

        let requests_failure = CounterVec::new(
            Opts::new(
                "strangler_proxy_failures_total",
                "Total number of requests that failed to reach an upstream",
            ),
            &["upstream", "error_type"],
        )?;

        let upstream_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "strangler_upstream_duration_seconds",
                "Time until upstream response headers arrived, in seconds",
            )
            .buckets(vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
            ]),
            &["upstream"],
        )?;

        let migration_decisions_total = CounterVec::new(
            Opts::new(
                "strangler_migration_decisions_total",
                "Routing decisions made for the migration-controlled route",
            ),
            &["target"],
        )?;

        let unmatched_requests_total = Counter::with_opts(Opts::new(
            "strangler_unmatched_requests_total",
            "Requests that matched no configured route prefix",
        ))?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(requests_failure.clone()))?;
        registry.register(Box::new(upstream_duration_seconds.clone()))?;
        registry.register(Box::new(migration_decisions_total.clone()))?;
        registry.register(Box::new(unmatched_requests_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            requests_failure,
            upstream_duration_seconds,
            migration_decisions_total,
            unmatched_requests_total,
        })
    }

    /// Get the Prometheus registry for exporting metrics
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render every registered metric in the Prometheus text format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }

    /// Record a request that an upstream answered (any status code)
    pub fn record_upstream_response(
        &self,
        upstream: &str,
        method: &str,
        status: u16,
        duration_secs: f64,
    ) {
        let status = status.to_string();
        self.requests_total
            .with_label_values(&[upstream, method, status.as_str()])
            .inc();
        self.upstream_duration_seconds
            .with_label_values(&[upstream])
            .observe(duration_secs);
    }

    /// Record a request that never got an upstream response
    pub fn record_forward_failure(&self, upstream: &str, error_type: &str, duration_secs: f64) {
        self.requests_failure
            .with_label_values(&[upstream, error_type])
            .inc();
        self.upstream_duration_seconds
            .with_label_values(&[upstream])
            .observe(duration_secs);
    }

    /// Record the target chosen for a migration-controlled request
    pub fn record_migration_decision(&self, target: &str) {
        self.migration_decisions_total
            .with_label_values(&[target])
            .inc();
    }

    /// Record a request that fell through every route
    pub fn record_unmatched(&self) {
        self.unmatched_requests_total.inc();
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}
