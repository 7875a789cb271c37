//! REST API Routes Module
//!
//! Route handlers grouped by resource, plus the router assembly:
//! - `/v1/user/*` and `/v1/workspace/*` resource routes
//! - Health check endpoints (Kubernetes-compatible)
//! - Prometheus metrics and the OpenAPI document
//! - CORS support for the browser app

pub mod health;
pub mod user;
pub mod workspace;

use std::time::Duration;

use axum::{
    http::{header, Method},
    middleware::from_fn,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::openapi::ApiDoc;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

pub use health::create_router as health_router;
pub use user::create_router as user_router;
pub use workspace::create_router as workspace_router;

// ============================================================================
// OPENAPI ENDPOINT
// ============================================================================

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// ============================================================================
// PRODUCTION VALIDATION
// ============================================================================

/// Validate API configuration for production use.
fn validate_api_config_for_production(config: &ApiConfig) -> ApiResult<()> {
    if config.cors_origins.is_empty() {
        return Err(ApiError::invalid_input(
            "CORS origins not configured for production. Set PLURA_CORS_ORIGINS.",
        ));
    }
    Ok(())
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// In development mode (empty origins), allows all origins.
/// In production mode, only allows configured origins.
pub fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::COOKIE,
        ])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        return cors.allow_origin(Any);
    }

    tracing::info!(origins = ?config.cors_origins, "CORS: allowing configured origins");
    let allowed = config.clone();
    let cors = cors.allow_origin(AllowOrigin::predicate(move |origin, _| {
        origin
            .to_str()
            .map(|o| allowed.is_origin_allowed(o))
            .unwrap_or(false)
    }));

    if config.cors_allow_credentials {
        cors.allow_credentials(true)
    } else {
        cors
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the complete API router.
///
/// - `/v1/user/*` and `/v1/workspace/*`
/// - `/health/*` (public)
/// - `/metrics` (Prometheus text format)
/// - `/openapi.json`
///
/// Layers, outermost first: CORS, request tracing, observability.
/// In production the CORS origin list must be configured.
pub fn create_api_router(state: AppState, api_config: &ApiConfig) -> ApiResult<Router> {
    if api_config.is_production() {
        validate_api_config_for_production(api_config)?;
    }

    let router = Router::new()
        .nest("/v1/user", user::create_router(&state))
        .nest("/v1/workspace", workspace::create_router(&state))
        .nest("/health", health::create_router(&state))
        .route("/metrics", get(metrics_handler))
        .route("/openapi.json", get(openapi_json));

    Ok(router
        .layer(from_fn(observability_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(api_config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_requires_origins() {
        let config = ApiConfig {
            environment: "production".to_string(),
            ..ApiConfig::default()
        };
        assert!(validate_api_config_for_production(&config).is_err());

        let config = ApiConfig {
            cors_origins: vec!["https://plura.app".to_string()],
            ..config
        };
        assert!(validate_api_config_for_production(&config).is_ok());
    }
}
