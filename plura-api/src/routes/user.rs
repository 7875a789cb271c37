//! User REST API Routes
//!
//! Read-only user endpoints. Users are created by the auth provider; this
//! service looks them up by session or id and lists them through the
//! cache-backed user directory.

use axum::{
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use plura_core::User;
use plura_storage::DataStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    auth::SessionProvider,
    error::{ApiError, ApiResult, ErrorBody, ServerErrorBody},
    extractors::{PageParams, PathParam},
    services::{UserDirectory, UserPage},
    state::AppState,
};

// ============================================================================
// TYPES
// ============================================================================

/// Single user response.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub user: User,
}

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for user routes.
#[derive(Clone)]
pub struct UserState {
    pub store: Arc<dyn DataStore>,
    pub sessions: Arc<dyn SessionProvider>,
    pub directory: UserDirectory,
}

impl UserState {
    pub fn new(app: &AppState) -> Self {
        Self {
            store: app.store.clone(),
            sessions: app.sessions.clone(),
            directory: app.user_directory(),
        }
    }
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /v1/user/self - Get the signed-in user
#[utoipa::path(
    get,
    path = "/v1/user/self",
    tag = "Users",
    responses(
        (status = 200, description = "Signed-in user", body = UserResponse),
        (status = 400, description = "Not logged in", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
        (status = 500, description = "Unexpected failure", body = ServerErrorBody),
    ),
    security(("session_cookie" = []), ("bearer_auth" = []))
)]
pub async fn get_self(
    State(state): State<Arc<UserState>>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let session = state
        .sessions
        .get_session(&headers)
        .await?
        .ok_or_else(ApiError::not_logged_in)?;

    let user = state
        .store
        .user_find_unique(&session.user_id)
        .await?
        .ok_or_else(ApiError::user_not_found)?;

    Ok(Json(UserResponse { user }))
}

/// GET /v1/user/all - List users a page at a time
#[utoipa::path(
    get,
    path = "/v1/user/all",
    tag = "Users",
    params(
        ("cursor" = Option<String>, Query, description = "Id of the record the page starts from"),
        ("take" = Option<String>, Query, description = "Page size, a positive integer (default 10)"),
    ),
    responses(
        (status = 200, description = "Page of users", body = UserPage),
        (status = 400, description = "Invalid take", body = ErrorBody),
        (status = 500, description = "Unexpected failure", body = ServerErrorBody),
    ),
)]
pub async fn list_users(
    State(state): State<Arc<UserState>>,
    params: PageParams,
) -> ApiResult<impl IntoResponse> {
    let take = params.take()?;
    let page = state.directory.page(params.cursor(), take).await?;

    tracing::debug!(
        returned = page.users.len(),
        next_cursor = ?page.next_cursor,
        "Listed users"
    );

    Ok(Json(page))
}

/// GET /v1/user/:id - Get a user by id
#[utoipa::path(
    get,
    path = "/v1/user/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 400, description = "Missing id", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
        (status = 500, description = "Unexpected failure", body = ServerErrorBody),
    ),
)]
pub async fn get_user(
    State(state): State<Arc<UserState>>,
    PathParam(id): PathParam,
) -> ApiResult<impl IntoResponse> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ApiError::missing("user id is required"));
    }

    let user = state
        .store
        .user_find_unique(id)
        .await?
        .ok_or_else(ApiError::user_not_found)?;

    Ok(Json(UserResponse { user }))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the user routes router.
pub fn create_router(app: &AppState) -> Router {
    let state = Arc::new(UserState::new(app));

    Router::new()
        .route("/self", get(get_self))
        .route("/all", get(list_users))
        .route("/:id", get(get_user))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_user_response_serialization() -> Result<(), serde_json::Error> {
        let response = UserResponse {
            user: User {
                id: "u01".to_string(),
                name: "Ada".to_string(),
                email: "ada@plura.test".to_string(),
                email_verified: false,
                image: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        };

        let json = serde_json::to_value(&response)?;
        assert_eq!(json["user"]["id"], "u01");
        assert_eq!(json["user"]["emailVerified"], false);
        assert!(json["user"].get("image").is_none());
        Ok(())
    }
}
