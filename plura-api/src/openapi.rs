//! OpenAPI Specification for the Plura API
//!
//! The document is assembled by utoipa from the route annotations and the
//! schema derives on request and response types.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use plura_core::{User, Workspace};

use crate::auth::DEFAULT_SESSION_COOKIE;
use crate::error::{ErrorBody, ServerErrorBody};
use crate::routes::health::{HealthStatus, Liveness, Probe, Readiness};
use crate::routes::user::UserResponse;
use crate::routes::workspace::{
    CreateWorkspaceForm, DeletedWorkspaceResponse, WorkspaceListResponse, WorkspacePage,
    WorkspaceResponse,
};
use crate::routes::{health, user, workspace};
use crate::services::UserPage;
use crate::telemetry;

/// OpenAPI document for the Plura API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Plura API",
        version = "0.1.0",
        description = "Users and workspaces for the Plura workspace app",
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Users", description = "Signed-in user, user lookup and the cached user listing"),
        (name = "Workspaces", description = "Workspace listing, lookup, creation and deletion"),
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        // === User Routes ===
        user::get_self,
        user::list_users,
        user::get_user,

        // === Workspace Routes ===
        workspace::list_workspaces,
        workspace::get_workspace,
        workspace::list_user_workspaces,
        workspace::create_workspace,
        workspace::delete_workspace,

        // === Health & Metrics ===
        health::ping,
        health::liveness,
        health::readiness,
        telemetry::metrics::metrics_handler,
    ),
    components(
        schemas(
            User, Workspace,
            UserResponse, UserPage,
            WorkspaceResponse, WorkspaceListResponse, WorkspacePage,
            DeletedWorkspaceResponse, CreateWorkspaceForm,
            ErrorBody, ServerErrorBody,
            Liveness, Readiness, Probe, HealthStatus,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security scheme modifier for OpenAPI document.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            // Session cookie set by the auth provider
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(DEFAULT_SESSION_COOKIE))),
            );

            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("Session token as a Bearer token"))
                        .build(),
                ),
            );
        }
    }
}

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}
