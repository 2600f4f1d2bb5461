//! Observability: Prometheus metrics.

pub mod metrics;
