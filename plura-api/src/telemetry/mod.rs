//! Plura Telemetry - Observability Infrastructure
//!
//! Structured logging through `tracing` and Prometheus metrics for the API
//! layer. Neither needs an external collector to run.

pub mod metrics;
pub mod middleware;
pub mod subscriber;

pub use metrics::{metrics, metrics_handler, PluraMetrics, METRICS};
pub use middleware::observability_middleware;
pub use subscriber::{init_tracing, LogFormat, TelemetryConfig};
