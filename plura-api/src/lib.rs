//! Plura API - REST Layer for Users and Workspaces
//!
//! Axum routes over two collaborators: a relational `DataStore` (Postgres
//! in production) and a `ListCache` (Redis in production) that backs the
//! paginated user listing. Sessions are resolved from the auth provider's
//! session cookie or a Bearer token.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use auth::{
    extract_session_token, sign_session_token, SessionConfig, SessionProvider,
    StoreSessionProvider,
};
pub use config::{ApiConfig, CacheConfig};
pub use db::{DbConfig, PgStore};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use services::{UserDirectory, UserPage};
pub use state::AppState;
