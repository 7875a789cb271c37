//! Error Types for the Plura API
//!
//! This module defines error handling for the HTTP layer:
//! - `ErrorCode` categorizes failures and maps each to a status code
//! - `ApiError` carries a code and a caller-facing message
//! - `IntoResponse` renders the JSON body clients see
//!
//! Client errors render `{"message": ..., "status": ...}`. Server errors
//! are logged with their detail and render only
//! `{"error": "Something went wrong"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use plura_core::{PluraError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Body returned for every 5xx response.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Authentication Errors
    // ========================================================================
    /// No session on an endpoint that reports it as a bad request
    NotLoggedIn,

    /// No session on an endpoint that requires one
    Unauthorized,

    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Required field or parameter is missing
    MissingField,

    /// Request body failed validation
    ValidationFailed,

    /// Query or path value could not be interpreted
    InvalidInput,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    UserNotFound,
    WorkspaceNotFound,

    /// The store reported no created record
    CreateFailed,

    // ========================================================================
    // Server Errors (500)
    // ========================================================================
    InternalError,
    DatabaseError,
    CacheError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::NotLoggedIn
            | ErrorCode::MissingField
            | ErrorCode::ValidationFailed
            | ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,

            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,

            // Create failure keeps the 404 clients already handle.
            ErrorCode::UserNotFound | ErrorCode::WorkspaceNotFound | ErrorCode::CreateFailed => {
                StatusCode::NOT_FOUND
            }

            ErrorCode::InternalError | ErrorCode::DatabaseError | ErrorCode::CacheError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether the detail must stay out of the response body.
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// RESPONSE BODIES
// ============================================================================

/// Body of a 4xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub message: String,
    pub status: u16,
}

/// Body of a 5xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ServerErrorBody {
    pub error: String,
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error for API operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Caller-facing message for 4xx, log detail for 5xx
    pub message: String,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    pub fn not_logged_in() -> Self {
        Self::new(ErrorCode::NotLoggedIn, "Not logged in")
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::Unauthorized, "unauthorized")
    }

    /// Create a MissingField error with an exact message.
    pub fn missing(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MissingField, message)
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn user_not_found() -> Self {
        Self::new(ErrorCode::UserNotFound, "User not found")
    }

    pub fn workspace_not_found() -> Self {
        Self::new(ErrorCode::WorkspaceNotFound, "workspace not found")
    }

    pub fn workspaces_not_found() -> Self {
        Self::new(ErrorCode::WorkspaceNotFound, "workspaces not found")
    }

    pub fn create_failed() -> Self {
        Self::new(ErrorCode::CreateFailed, "failed to create workspace")
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn cache_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CacheError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.code.is_server_error() {
            tracing::error!(code = %self.code, detail = %self.message, "Request failed");
            let body = ServerErrorBody {
                error: GENERIC_ERROR_MESSAGE.to_string(),
            };
            return (status, Json(body)).into_response();
        }

        let body = ErrorBody {
            message: self.message,
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<PluraError> for ApiError {
    fn from(err: PluraError) -> Self {
        match err {
            PluraError::Storage(e) => ApiError::database_error(e.to_string()),
            PluraError::Cache(e) => ApiError::cache_error(e.to_string()),
            PluraError::Validation(ValidationError::RequiredFieldMissing { field }) => {
                ApiError::missing(format!("{} is required", field))
            }
        }
    }
}

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use plura_core::{CacheError, StorageError};

    async fn body_json(response: Response) -> Result<serde_json::Value, String> {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| e.to_string())?;
        serde_json::from_slice(&bytes).map_err(|e| e.to_string())
    }

    #[test]
    fn test_error_code_status_mapping() {
        assert_eq!(ErrorCode::NotLoggedIn.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::MissingField.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::UserNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::CreateFailed.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::DatabaseError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_client_error_body_carries_message_and_status() -> Result<(), String> {
        let response = ApiError::not_logged_in().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await?;
        assert_eq!(body["message"], "Not logged in");
        assert_eq!(body["status"], 400);
        Ok(())
    }

    #[tokio::test]
    async fn test_server_error_body_hides_detail() -> Result<(), String> {
        let response = ApiError::database_error("relation \"user\" does not exist").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await?;
        assert_eq!(body, serde_json::json!({ "error": "Something went wrong" }));
        Ok(())
    }

    #[test]
    fn test_plura_error_conversion() {
        let err: ApiError = PluraError::from(StorageError::LockPoisoned).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);

        let err: ApiError = PluraError::from(CacheError::LockPoisoned).into();
        assert_eq!(err.code, ErrorCode::CacheError);

        let err: ApiError = PluraError::from(ValidationError::RequiredFieldMissing {
            field: "name".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::MissingField);
        assert_eq!(err.message, "name is required");
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::workspace_not_found();
        let display = err.to_string();
        assert!(display.contains("WorkspaceNotFound"));
        assert!(display.contains("workspace not found"));
    }
}
