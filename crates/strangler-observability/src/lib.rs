//! Strangler Gateway Observability
//!
//! Prometheus metrics for forwarded requests, forward failures, upstream
//! latency, migration decisions and unmatched paths.

pub mod metrics;

pub use metrics::Metrics;
