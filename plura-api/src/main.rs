//! Plura API Server Entry Point
//!
//! Bootstraps configuration, connects the data store and the list cache,
//! and starts the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use plura_api::telemetry::{init_tracing, TelemetryConfig};
use plura_api::{
    create_api_router, ApiConfig, ApiError, ApiResult, AppState, CacheConfig, DbConfig, PgStore,
    SessionConfig, StoreSessionProvider,
};
use plura_storage::{DataStore, InMemoryListCache, ListCache, RedisListCache};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::from_env();
    init_tracing(&telemetry_config)?;

    let db_config = DbConfig::from_env();
    let store: Arc<dyn DataStore> = Arc::new(PgStore::from_config(&db_config)?);

    let cache_config = CacheConfig::from_env();
    let cache: Arc<dyn ListCache> = match cache_config.redis_url.as_deref() {
        Some(url) => {
            tracing::info!("Using Redis for the user listing cache");
            Arc::new(RedisListCache::connect(url).await?)
        }
        None => {
            tracing::warn!("PLURA_REDIS_URL not set, using in-process user listing cache");
            Arc::new(InMemoryListCache::new())
        }
    };

    let sessions = Arc::new(StoreSessionProvider::new(
        store.clone(),
        SessionConfig::from_env(),
    ));

    let api_config = ApiConfig::from_env();
    let state = AppState::new(store, cache, sessions, cache_config);
    let app: Router = create_api_router(state, &api_config)?;

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, service = %telemetry_config.service_name, "Starting Plura API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("PLURA_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("PLURA_API_PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
