//! Axum Middleware for HTTP Request Tracing and Metrics
//!
//! Wraps every request in a tracing span and records Prometheus metrics
//! labelled by the matched route template, so `/v1/user/:id` is one series
//! no matter how many ids are requested.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use tracing::{info_span, Instrument};

use super::metrics::metrics;

/// Route label for requests that matched no route.
const UNMATCHED_ROUTE: &str = "unmatched";

fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string())
}

/// Observability middleware for Axum.
///
/// Records a span, request metrics and a completion log line.
pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = route_label(&request);

    let span = info_span!(
        "http_request",
        http.method = %method,
        http.target = %path,
        http.route = %route,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    let status = response.status();

    if let Some(metrics) = metrics() {
        metrics.record_http_request(
            method.as_str(),
            &route,
            status.as_u16(),
            duration.as_secs_f64(),
        );
    }

    tracing::info!(
        method = %method,
        path = %path,
        route = %route,
        status = status.as_u16(),
        duration_ms = duration.as_millis() as u64,
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware::from_fn, routing::get, Router};
    use tower::ServiceExt;

    fn test_app() -> Router {
        Router::new()
            .route("/probe/:id", get(|| async { "ok" }))
            .layer(from_fn(observability_middleware))
    }

    #[tokio::test]
    async fn test_metrics_use_route_template() -> Result<(), String> {
        let metrics = metrics().ok_or("metrics not registered")?;
        let counter = metrics
            .http_requests_total
            .with_label_values(&["GET", "/probe/:id", "200"]);
        let before = counter.get();

        for id in ["a", "b"] {
            let request = axum::http::Request::builder()
                .uri(format!("/probe/{}", id))
                .body(Body::empty())
                .map_err(|e| e.to_string())?;
            let response = test_app().oneshot(request).await.map_err(|e| e.to_string())?;
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert!(counter.get() - before >= 2.0);
        Ok(())
    }
}
