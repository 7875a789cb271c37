//! Plura records
//!
//! Field names serialize in camelCase so the JSON shape matches the rows
//! the auth provider writes and what clients already consume.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::{RecordId, Timestamp};

// ============================================================================
// USER
// ============================================================================

/// A registered user.
///
/// Users are created and mutated only by the auth provider's registration
/// flow. This service reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

// ============================================================================
// WORKSPACE
// ============================================================================

/// A workspace owned by exactly one user.
///
/// `created_at` is the sort key for workspace pagination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: RecordId,
    pub name: String,
    pub user_id: RecordId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

/// Input for creating a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkspace {
    pub name: String,
    pub user_id: RecordId,
}

impl NewWorkspace {
    pub fn new(name: impl Into<String>, user_id: impl Into<RecordId>) -> Self {
        Self {
            name: name.into(),
            user_id: user_id.into(),
        }
    }

    /// Reject an empty name and a missing owner.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "name".to_string(),
            });
        }
        if self.user_id.is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "userId".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// SESSION
// ============================================================================

/// An authenticated session issued by the auth provider.
///
/// Sessions are resolved per request and never written by this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: RecordId,
    pub token: String,
    pub user_id: RecordId,
    pub expires_at: Timestamp,
}

impl Session {
    /// Whether the session has lapsed at `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn fixed_time() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    #[test]
    fn test_user_serializes_camel_case() -> Result<(), serde_json::Error> {
        let user = User {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            email_verified: true,
            image: None,
            created_at: fixed_time(),
            updated_at: fixed_time(),
        };

        let json = serde_json::to_value(&user)?;
        assert_eq!(json["emailVerified"], true);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("image").is_none());

        let back: User = serde_json::from_value(json)?;
        assert_eq!(back, user);
        Ok(())
    }

    #[test]
    fn test_workspace_serializes_user_id() -> Result<(), serde_json::Error> {
        let workspace = Workspace {
            id: "w1".to_string(),
            name: "Acme".to_string(),
            user_id: "u1".to_string(),
            created_at: fixed_time(),
            updated_at: fixed_time(),
        };
        let json = serde_json::to_value(&workspace)?;
        assert_eq!(json["userId"], "u1");
        Ok(())
    }

    #[test]
    fn test_new_workspace_validation() {
        assert!(NewWorkspace::new("Acme", "u1").validate().is_ok());
        assert!(NewWorkspace::new("", "u1").validate().is_err());
        assert!(NewWorkspace::new("Acme", "").validate().is_err());
        // Only an empty name is missing; whitespace is a name.
        assert!(NewWorkspace::new("   ", "u1").validate().is_ok());
    }

    #[cfg(feature = "openapi")]
    #[test]
    fn test_timestamps_document_as_date_time() -> Result<(), serde_json::Error> {
        use utoipa::openapi::{RefOr, Schema};
        use utoipa::PartialSchema;

        let RefOr::T(Schema::Object(workspace)) = Workspace::schema() else {
            panic!("Workspace schema should be an inline object");
        };
        let created = serde_json::to_value(&workspace.properties["createdAt"])?;
        assert_eq!(created["type"], "string");
        assert_eq!(created["format"], "date-time");
        Ok(())
    }

    #[test]
    fn test_session_expiry() {
        let now = fixed_time();
        let session = Session {
            id: "s1".to_string(),
            token: "tok".to_string(),
            user_id: "u1".to_string(),
            expires_at: now + Duration::hours(1),
        };
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::hours(2)));
    }
}
