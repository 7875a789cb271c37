//! Async data store contract.
//!
//! Mirrors the query surface the handlers need: find-unique, find-many
//! with cursor pagination, filtered lists, create, and a conditional
//! delete. Absence is `Ok(None)` / an empty `Vec`, never an error.

use async_trait::async_trait;
use plura_core::{NewWorkspace, PageRequest, PluraResult, Session, User, Workspace};

/// Typed query interface over the relational store.
#[async_trait]
pub trait DataStore: Send + Sync {
    // ========================================================================
    // USER OPERATIONS
    // ========================================================================

    /// Get a user by id.
    async fn user_find_unique(&self, id: &str) -> PluraResult<Option<User>>;

    /// Page through users ordered by `id` ascending.
    async fn user_find_many(&self, page: &PageRequest) -> PluraResult<Vec<User>>;

    // ========================================================================
    // WORKSPACE OPERATIONS
    // ========================================================================

    /// Get a workspace by id.
    async fn workspace_find_unique(&self, id: &str) -> PluraResult<Option<Workspace>>;

    /// Page through workspaces ordered by `created_at` ascending, ties by id.
    async fn workspace_find_many(&self, page: &PageRequest) -> PluraResult<Vec<Workspace>>;

    /// All workspaces owned by `user_id`, oldest first.
    async fn workspace_list_by_user(&self, user_id: &str) -> PluraResult<Vec<Workspace>>;

    /// Insert a workspace. `None` when the store reports no created row.
    async fn workspace_create(&self, new: &NewWorkspace) -> PluraResult<Option<Workspace>>;

    /// Delete the workspace only if `owner_id` owns it, in a single
    /// operation. Returns the deleted record, or `None` when nothing matched.
    async fn workspace_delete_owned(
        &self,
        id: &str,
        owner_id: &str,
    ) -> PluraResult<Option<Workspace>>;

    // ========================================================================
    // SESSION OPERATIONS
    // ========================================================================

    /// Look up a session by its token. Expiry is the caller's concern.
    async fn session_find_by_token(&self, token: &str) -> PluraResult<Option<Session>>;

    // ========================================================================
    // HEALTH
    // ========================================================================

    /// Round-trip to the store.
    async fn health_check(&self) -> PluraResult<()>;
}
