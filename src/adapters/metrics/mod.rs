//! Metrics and Monitoring Adapters
//!
//! Prometheus metrics plus /live and /ready probes, served together by
//! one axum 0.7 server when `METRICS_BIND_ADDR` is set.

pub mod health;
pub mod prometheus;

pub use health::{HealthServer, HealthState};
pub use prometheus::MetricsRegistry;
