//! Workspace REST API Routes
//!
//! Listing, lookup, creation and owner-only deletion of workspaces.
//! Creation and deletion act on behalf of the caller's session.

use axum::{
    extract::{rejection::FormRejection, RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use plura_core::{NewWorkspace, PageRequest, Workspace};
use plura_storage::DataStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    auth::SessionProvider,
    error::{ApiError, ApiResult, ErrorBody, ServerErrorBody},
    extractors::{PageParams, PathParam},
    state::AppState,
};

/// Location the listing redirects to when called without a cursor.
const CURSOR_REDIRECT: &str = "?cursor=";

// ============================================================================
// TYPES
// ============================================================================

/// Form body for creating a workspace.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct CreateWorkspaceForm {
    pub name: String,
}

/// Page of workspaces.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkspacePage {
    pub workspaces: Vec<Workspace>,
    /// Id of the last workspace returned, `null` for an empty page.
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct WorkspaceResponse {
    pub workspace: Workspace,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct WorkspaceListResponse {
    pub workspaces: Vec<Workspace>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedWorkspaceResponse {
    pub deleted_workspace: Workspace,
}

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for workspace routes.
#[derive(Clone)]
pub struct WorkspaceState {
    pub store: Arc<dyn DataStore>,
    pub sessions: Arc<dyn SessionProvider>,
}

impl WorkspaceState {
    pub fn new(app: &AppState) -> Self {
        Self {
            store: app.store.clone(),
            sessions: app.sessions.clone(),
        }
    }
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /v1/workspace/all - List workspaces oldest first
///
/// Requests whose query string lacks `cursor=` are redirected to
/// `?cursor=` first.
#[utoipa::path(
    get,
    path = "/v1/workspace/all",
    tag = "Workspaces",
    params(
        ("cursor" = Option<String>, Query, description = "Id of the record the page starts from"),
        ("take" = Option<String>, Query, description = "Page size, a positive integer (default 10)"),
    ),
    responses(
        (status = 200, description = "Page of workspaces", body = WorkspacePage),
        (status = 302, description = "Redirect to ?cursor="),
        (status = 400, description = "Invalid take", body = ErrorBody),
        (status = 500, description = "Unexpected failure", body = ServerErrorBody),
    ),
)]
pub async fn list_workspaces(
    State(state): State<Arc<WorkspaceState>>,
    RawQuery(raw_query): RawQuery,
    params: ApiResult<PageParams>,
) -> ApiResult<Response> {
    if !raw_query.as_deref().unwrap_or_default().contains("cursor=") {
        return Ok((StatusCode::FOUND, [(header::LOCATION, CURSOR_REDIRECT)]).into_response());
    }

    let params = params?;
    let take = params.take()?;
    let cursor = params.cursor().map(str::to_string);
    // The cursor row was the last row of the previous page.
    let skip = usize::from(cursor.is_some());
    let request = PageRequest::first(take).with_cursor(cursor).with_skip(skip);

    let workspaces = state.store.workspace_find_many(&request).await?;
    let next_cursor = workspaces.last().map(|w| w.id.clone());

    Ok(Json(WorkspacePage {
        workspaces,
        next_cursor,
    })
    .into_response())
}

/// GET /v1/workspace/:id - Get a workspace by id
#[utoipa::path(
    get,
    path = "/v1/workspace/{id}",
    tag = "Workspaces",
    params(("id" = String, Path, description = "Workspace id")),
    responses(
        (status = 200, description = "Workspace", body = WorkspaceResponse),
        (status = 400, description = "Missing id", body = ErrorBody),
        (status = 404, description = "Workspace not found", body = ErrorBody),
        (status = 500, description = "Unexpected failure", body = ServerErrorBody),
    ),
)]
pub async fn get_workspace(
    State(state): State<Arc<WorkspaceState>>,
    PathParam(id): PathParam,
) -> ApiResult<impl IntoResponse> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ApiError::missing("missing workspace id"));
    }

    let workspace = state
        .store
        .workspace_find_unique(id)
        .await?
        .ok_or_else(ApiError::workspace_not_found)?;

    Ok(Json(WorkspaceResponse { workspace }))
}

/// GET /v1/workspace/user/:userId - List a user's workspaces
#[utoipa::path(
    get,
    path = "/v1/workspace/user/{userId}",
    tag = "Workspaces",
    params(("userId" = String, Path, description = "Owner's user id")),
    responses(
        (status = 200, description = "Workspaces owned by the user", body = WorkspaceListResponse),
        (status = 400, description = "Missing user id", body = ErrorBody),
        (status = 404, description = "User owns no workspaces", body = ErrorBody),
        (status = 500, description = "Unexpected failure", body = ServerErrorBody),
    ),
)]
pub async fn list_user_workspaces(
    State(state): State<Arc<WorkspaceState>>,
    PathParam(user_id): PathParam,
) -> ApiResult<impl IntoResponse> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::missing("missing user id"));
    }

    let workspaces = state.store.workspace_list_by_user(user_id).await?;
    if workspaces.is_empty() {
        return Err(ApiError::workspaces_not_found());
    }

    Ok(Json(WorkspaceListResponse { workspaces }))
}

/// POST /v1/workspace - Create a workspace owned by the caller
#[utoipa::path(
    post,
    path = "/v1/workspace",
    tag = "Workspaces",
    request_body(content = CreateWorkspaceForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Created workspace", body = WorkspaceResponse),
        (status = 400, description = "Missing body, name or session", body = ErrorBody),
        (status = 404, description = "Store created nothing", body = ErrorBody),
        (status = 500, description = "Unexpected failure", body = ServerErrorBody),
    ),
    security(("session_cookie" = []), ("bearer_auth" = []))
)]
pub async fn create_workspace(
    State(state): State<Arc<WorkspaceState>>,
    headers: HeaderMap,
    form: Result<Form<CreateWorkspaceForm>, FormRejection>,
) -> ApiResult<impl IntoResponse> {
    let Form(form) = form.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected workspace form");
        ApiError::validation_failed("missing body")
    })?;
    if form.name.is_empty() {
        return Err(ApiError::validation_failed("name is required"));
    }

    let session = state.sessions.get_session(&headers).await?;
    let user_id = session
        .map(|s| s.user_id)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::missing("missing user id"))?;

    let new = NewWorkspace::new(form.name, user_id);
    let workspace = state
        .store
        .workspace_create(&new)
        .await?
        .ok_or_else(ApiError::create_failed)?;

    tracing::info!(
        workspace_id = %workspace.id,
        user_id = %workspace.user_id,
        "Workspace created"
    );

    Ok(Json(WorkspaceResponse { workspace }))
}

/// DELETE /v1/workspace/:id - Delete a workspace the caller owns
#[utoipa::path(
    delete,
    path = "/v1/workspace/{id}",
    tag = "Workspaces",
    params(("id" = String, Path, description = "Workspace id")),
    responses(
        (status = 200, description = "Deleted workspace", body = DeletedWorkspaceResponse),
        (status = 400, description = "Missing id", body = ErrorBody),
        (status = 401, description = "No session", body = ErrorBody),
        (status = 404, description = "No workspace with that id owned by the caller", body = ErrorBody),
        (status = 500, description = "Unexpected failure", body = ServerErrorBody),
    ),
    security(("session_cookie" = []), ("bearer_auth" = []))
)]
pub async fn delete_workspace(
    State(state): State<Arc<WorkspaceState>>,
    headers: HeaderMap,
    PathParam(id): PathParam,
) -> ApiResult<impl IntoResponse> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ApiError::missing("missing workspace id"));
    }

    let session = state
        .sessions
        .get_session(&headers)
        .await?
        .filter(|s| !s.user_id.is_empty())
        .ok_or_else(ApiError::unauthorized)?;

    // Ownership check and delete happen in one store call.
    let deleted = state
        .store
        .workspace_delete_owned(id, &session.user_id)
        .await?
        .ok_or_else(ApiError::workspace_not_found)?;

    tracing::info!(
        workspace_id = %deleted.id,
        user_id = %session.user_id,
        "Workspace deleted"
    );

    Ok(Json(DeletedWorkspaceResponse {
        deleted_workspace: deleted,
    }))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the workspace routes router.
pub fn create_router(app: &AppState) -> Router {
    let state = Arc::new(WorkspaceState::new(app));

    Router::new()
        .route("/", post(create_workspace))
        .route("/all", get(list_workspaces))
        .route("/user/:user_id", get(list_user_workspaces))
        .route("/:id", get(get_workspace).delete(delete_workspace))
        .with_state(state)
}
