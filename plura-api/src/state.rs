//! Shared application state for Axum routers.

use std::sync::Arc;

use plura_storage::{DataStore, ListCache};

use crate::auth::SessionProvider;
use crate::config::CacheConfig;
use crate::services::UserDirectory;

/// Collaborators every route group is built from.
///
/// Each field is a trait object so tests can substitute in-memory or
/// instrumented implementations.
#[derive(Clone)]
pub struct AppState {
    /// Relational store for users, workspaces and sessions.
    pub store: Arc<dyn DataStore>,
    /// List cache backing the user listing.
    pub cache: Arc<dyn ListCache>,
    /// Resolves the caller's session from request headers.
    pub sessions: Arc<dyn SessionProvider>,
    /// Cache key and TTL for the user listing.
    pub cache_config: CacheConfig,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DataStore>,
        cache: Arc<dyn ListCache>,
        sessions: Arc<dyn SessionProvider>,
        cache_config: CacheConfig,
    ) -> Self {
        Self {
            store,
            cache,
            sessions,
            cache_config,
            start_time: std::time::Instant::now(),
        }
    }

    /// The cached user listing over this state's store and cache.
    pub fn user_directory(&self) -> UserDirectory {
        UserDirectory::new(self.store.clone(), self.cache.clone(), &self.cache_config)
    }
}
