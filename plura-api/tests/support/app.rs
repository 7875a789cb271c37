#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use plura_api::{
    create_api_router, ApiConfig, AppState, CacheConfig, SessionConfig, StoreSessionProvider,
};
use plura_storage::{DataStore, InMemoryDataStore, InMemoryListCache, ListCache};
use serde_json::Value;
use tower::ServiceExt;

/// Router over in-memory collaborators, plus handles to inspect them.
pub struct TestApp {
    pub router: Router,
    pub store: InMemoryDataStore,
    pub cache: Arc<dyn ListCache>,
}

pub fn test_app(store: InMemoryDataStore) -> Result<TestApp, String> {
    test_app_with_cache(store, Arc::new(InMemoryListCache::new()))
}

pub fn test_app_with_cache(
    store: InMemoryDataStore,
    cache: Arc<dyn ListCache>,
) -> Result<TestApp, String> {
    test_app_with_sessions(store, cache, SessionConfig::default())
}

pub fn test_app_with_sessions(
    store: InMemoryDataStore,
    cache: Arc<dyn ListCache>,
    session_config: SessionConfig,
) -> Result<TestApp, String> {
    let shared: Arc<dyn DataStore> = Arc::new(store.clone());
    let sessions = Arc::new(StoreSessionProvider::new(shared.clone(), session_config));
    let state = AppState::new(shared, cache.clone(), sessions, CacheConfig::default());
    let router = create_api_router(state, &ApiConfig::default()).map_err(|e| e.to_string())?;
    Ok(TestApp {
        router,
        store,
        cache,
    })
}

/// Response status, headers and JSON body (`Null` for an empty body).
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(router: &Router, request: Request<Body>) -> Result<TestResponse, String> {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .map_err(|e| format!("request failed: {}", e))?;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .map_err(|e| e.to_string())?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).map_err(|e| format!("invalid JSON body: {}", e))?
    };
    Ok(TestResponse {
        status,
        headers,
        body,
    })
}

pub fn get(uri: &str) -> Result<Request<Body>, String> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .map_err(|e| e.to_string())
}

pub fn get_as(uri: &str, token: &str) -> Result<Request<Body>, String> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .map_err(|e| e.to_string())
}

pub fn post_form(uri: &str, form: &str, token: Option<&str>) -> Result<Request<Body>, String> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(form.to_string()))
        .map_err(|e| e.to_string())
}

pub fn delete_as(uri: &str, token: Option<&str>) -> Result<Request<Body>, String> {
    let mut builder = Request::builder().method("DELETE").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).map_err(|e| e.to_string())
}

/// Ids of the records in a JSON array field.
pub fn ids(body: &Value, field: &str) -> Vec<String> {
    body[field]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
