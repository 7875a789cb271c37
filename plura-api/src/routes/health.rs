//! Health probes for the API process and its two collaborators.
//!
//! `/health/live` never touches a backend. `/health/ready` round-trips the
//! relational store and reads the length of the user listing cache; the
//! store decides readiness, a failing cache only degrades it.

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use plura_storage::{DataStore, ListCache};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// The store answers but the listing cache does not.
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Liveness {
    pub status: HealthStatus,
}

/// Outcome of probing one backend.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Probe {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Probe {
    fn up(started: Instant) -> Self {
        Self {
            status: HealthStatus::Healthy,
            latency_ms: Some(started.elapsed().as_millis() as u64),
            error: None,
        }
    }

    fn down(error: impl std::fmt::Display) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            latency_ms: None,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Readiness {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub store: Probe,
    pub cache: Probe,
    /// Entries currently held under the user listing key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_users: Option<usize>,
}

impl Readiness {
    fn overall(store: &Probe, cache: &Probe) -> HealthStatus {
        match (store.status, cache.status) {
            (HealthStatus::Healthy, HealthStatus::Healthy) => HealthStatus::Healthy,
            (HealthStatus::Healthy, _) => HealthStatus::Degraded,
            _ => HealthStatus::Unhealthy,
        }
    }
}

#[derive(Clone)]
pub struct HealthState {
    store: Arc<dyn DataStore>,
    cache: Arc<dyn ListCache>,
    users_key: String,
    started: Instant,
}

impl HealthState {
    pub fn new(app: &AppState) -> Self {
        Self {
            store: app.store.clone(),
            cache: app.cache.clone(),
            users_key: app.cache_config.users_key.clone(),
            started: app.start_time,
        }
    }

    async fn probe_store(&self) -> Probe {
        let started = Instant::now();
        match self.store.health_check().await {
            Ok(()) => Probe::up(started),
            Err(e) => {
                tracing::warn!(error = %e, "store readiness probe failed");
                Probe::down(e)
            }
        }
    }

    async fn probe_cache(&self) -> (Probe, Option<usize>) {
        let started = Instant::now();
        match self.cache.len(&self.users_key).await {
            Ok(len) => (Probe::up(started), Some(len)),
            Err(e) => {
                tracing::warn!(error = %e, key = %self.users_key, "cache readiness probe failed");
                (Probe::down(e), None)
            }
        }
    }
}

/// GET /health/ping
#[utoipa::path(
    get,
    path = "/health/ping",
    tag = "Health",
    responses((status = 200, description = "Plain `pong`", body = String)),
)]
pub async fn ping() -> &'static str {
    "pong"
}

/// GET /health/live
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, description = "Process is running", body = Liveness)),
)]
pub async fn liveness() -> Json<Liveness> {
    Json(Liveness {
        status: HealthStatus::Healthy,
    })
}

/// GET /health/ready
///
/// Answers 503 only when the store probe fails.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Store reachable; cache may be degraded", body = Readiness),
        (status = 503, description = "Store unreachable", body = Readiness),
    ),
)]
pub async fn readiness(State(state): State<Arc<HealthState>>) -> (StatusCode, Json<Readiness>) {
    let (store, (cache, cached_users)) = tokio::join!(state.probe_store(), state.probe_cache());
    let status = Readiness::overall(&store, &cache);

    let code = match status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };

    let report = Readiness {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started.elapsed().as_secs(),
        store,
        cache,
        cached_users,
    };
    (code, Json(report))
}

/// Public probe routes, nested under `/health`.
pub fn create_router(app: &AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .with_state(Arc::new(HealthState::new(app)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(status: HealthStatus) -> Probe {
        Probe {
            status,
            latency_ms: None,
            error: None,
        }
    }

    #[test]
    fn test_store_failure_dominates() {
        use HealthStatus::*;
        assert_eq!(Readiness::overall(&probe(Healthy), &probe(Healthy)), Healthy);
        assert_eq!(Readiness::overall(&probe(Healthy), &probe(Unhealthy)), Degraded);
        assert_eq!(Readiness::overall(&probe(Unhealthy), &probe(Healthy)), Unhealthy);
        assert_eq!(Readiness::overall(&probe(Unhealthy), &probe(Unhealthy)), Unhealthy);
    }

    #[test]
    fn test_failed_probe_serializes_error_only() -> Result<(), serde_json::Error> {
        let json = serde_json::to_value(Probe::down("connection refused"))?;
        assert_eq!(json["status"], "unhealthy");
        assert_eq!(json["error"], "connection refused");
        assert!(json.get("latencyMs").is_none());
        Ok(())
    }
}
