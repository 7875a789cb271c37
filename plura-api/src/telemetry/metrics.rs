//! Prometheus Metrics Definitions
//!
//! Defines the Plura API metrics and exposes a /metrics endpoint for
//! Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Database operation latency buckets (seconds)
const DB_LATENCY_BUCKETS: &[f64] =
    &[0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0];

/// Global metrics instance - initialized once on first use
pub static METRICS: Lazy<ApiResult<PluraMetrics>> = Lazy::new(PluraMetrics::new);

/// Registered metrics, or `None` if registration failed.
pub fn metrics() -> Option<&'static PluraMetrics> {
    METRICS.as_ref().ok()
}

/// Container for all Plura API metrics.
#[derive(Clone)]
pub struct PluraMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Database operation counter - labels: operation, entity, status
    pub db_operations_total: CounterVec,

    /// Database operation duration histogram - labels: operation, entity
    pub db_operation_duration_seconds: HistogramVec,

    /// User-listing cache lookups - labels: result (hit/miss)
    pub users_cache_lookups_total: CounterVec,
}

fn registration_error(name: &'static str) -> impl FnOnce(prometheus::Error) -> ApiError {
    move |e| ApiError::internal_error(format!("Failed to register {}: {}", name, e))
}

impl PluraMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "plura_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(registration_error("http_requests_total"))?,

            http_request_duration_seconds: register_histogram_vec!(
                "plura_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(registration_error("http_request_duration_seconds"))?,

            db_operations_total: register_counter_vec!(
                "plura_db_operations_total",
                "Total number of database operations",
                &["operation", "entity", "status"]
            )
            .map_err(registration_error("db_operations_total"))?,

            db_operation_duration_seconds: register_histogram_vec!(
                "plura_db_operation_duration_seconds",
                "Database operation duration in seconds",
                &["operation", "entity"],
                DB_LATENCY_BUCKETS.to_vec()
            )
            .map_err(registration_error("db_operation_duration_seconds"))?,

            users_cache_lookups_total: register_counter_vec!(
                "plura_users_cache_lookups_total",
                "User-listing cache lookups by result",
                &["result"]
            )
            .map_err(registration_error("users_cache_lookups_total"))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, status_str.as_str()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record a database operation.
    pub fn record_db_operation(
        &self,
        operation: &str,
        entity: &str,
        success: bool,
        duration_secs: f64,
    ) {
        let status = if success { "success" } else { "error" };
        self.db_operations_total
            .with_label_values(&[operation, entity, status])
            .inc();
        self.db_operation_duration_seconds
            .with_label_values(&[operation, entity])
            .observe(duration_secs);
    }

    /// Record whether the user-listing cache was warm.
    pub fn record_users_cache(&self, hit: bool) {
        let result = if hit { "hit" } else { "miss" };
        self.users_cache_lookups_total
            .with_label_values(&[result])
            .inc();
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
)]
pub async fn metrics_handler() -> impl IntoResponse {
    // Registers the families if nothing has recorded yet.
    let _ = metrics();

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::core::Collector;

    fn registered() -> Result<&'static PluraMetrics, String> {
        METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.message))
    }

    #[test]
    fn test_metrics_creation() -> Result<(), String> {
        let metrics = registered()?;
        assert!(!metrics.http_requests_total.desc().is_empty());
        Ok(())
    }

    #[test]
    fn test_record_http_request() -> Result<(), String> {
        let metrics = registered()?;
        metrics.record_http_request("GET", "/v1/test/record", 200, 0.015);
        let count = metrics
            .http_requests_total
            .with_label_values(&["GET", "/v1/test/record", "200"])
            .get();
        assert!(count >= 1.0);
        Ok(())
    }

    #[test]
    fn test_record_db_operation() -> Result<(), String> {
        let metrics = registered()?;
        metrics.record_db_operation("find_unique", "test_entity", true, 0.005);
        metrics.record_db_operation("find_unique", "test_entity", false, 0.010);
        let failures = metrics
            .db_operations_total
            .with_label_values(&["find_unique", "test_entity", "error"])
            .get();
        assert!(failures >= 1.0);
        Ok(())
    }

    #[test]
    fn test_users_cache_counter() -> Result<(), String> {
        let metrics = registered()?;
        let before = metrics
            .users_cache_lookups_total
            .with_label_values(&["hit"])
            .get();
        metrics.record_users_cache(true);
        let after = metrics
            .users_cache_lookups_total
            .with_label_values(&["hit"])
            .get();
        assert!(after > before);
        Ok(())
    }

    #[tokio::test]
    async fn test_metrics_handler_renders_text() -> Result<(), String> {
        registered()?.record_users_cache(false);

        let response = metrics_handler().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| e.to_string())?;
        let text = String::from_utf8(bytes.to_vec()).map_err(|e| e.to_string())?;
        assert!(text.contains("plura_users_cache_lookups_total"));
        Ok(())
    }
}
