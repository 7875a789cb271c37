//! In-memory data store for tests and local development.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use plura_core::{
    new_record_id, NewWorkspace, PageRequest, PluraResult, Session, StorageError, User, Workspace,
};

use crate::data_store::DataStore;

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StorageError> {
    lock.read().map_err(|_| StorageError::LockPoisoned)
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StorageError> {
    lock.write().map_err(|_| StorageError::LockPoisoned)
}

/// In-memory `DataStore`.
///
/// Users are kept in a `BTreeMap` so iteration order is id order, which is
/// the order `user_find_many` pages in. Clones share the same data.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDataStore {
    users: Arc<RwLock<BTreeMap<String, User>>>,
    workspaces: Arc<RwLock<HashMap<String, Workspace>>>,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryDataStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user.
    pub fn insert_user(&self, user: User) -> PluraResult<()> {
        write(&self.users)?.insert(user.id.clone(), user);
        Ok(())
    }

    /// Insert or replace a workspace, keeping its timestamps.
    pub fn insert_workspace(&self, workspace: Workspace) -> PluraResult<()> {
        write(&self.workspaces)?.insert(workspace.id.clone(), workspace);
        Ok(())
    }

    /// Insert or replace a session, keyed by token.
    pub fn insert_session(&self, session: Session) -> PluraResult<()> {
        write(&self.sessions)?.insert(session.token.clone(), session);
        Ok(())
    }

    /// Number of stored users.
    pub fn user_count(&self) -> PluraResult<usize> {
        Ok(read(&self.users)?.len())
    }

    /// Number of stored workspaces.
    pub fn workspace_count(&self) -> PluraResult<usize> {
        Ok(read(&self.workspaces)?.len())
    }

    /// Make every subsequent call fail with a connection error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), StorageError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::ConnectionFailed {
                reason: "store is offline".to_string(),
            });
        }
        Ok(())
    }

    fn sorted_workspaces(&self) -> Result<Vec<Workspace>, StorageError> {
        let mut all: Vec<Workspace> = read(&self.workspaces)?.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }
}

#[async_trait]
impl DataStore for InMemoryDataStore {
    async fn user_find_unique(&self, id: &str) -> PluraResult<Option<User>> {
        self.ensure_online()?;
        Ok(read(&self.users)?.get(id).cloned())
    }

    async fn user_find_many(&self, page: &PageRequest) -> PluraResult<Vec<User>> {
        self.ensure_online()?;
        let all: Vec<User> = read(&self.users)?.values().cloned().collect();
        Ok(page.apply(all, |u| u.id.as_str()))
    }

    async fn workspace_find_unique(&self, id: &str) -> PluraResult<Option<Workspace>> {
        self.ensure_online()?;
        Ok(read(&self.workspaces)?.get(id).cloned())
    }

    async fn workspace_find_many(&self, page: &PageRequest) -> PluraResult<Vec<Workspace>> {
        self.ensure_online()?;
        let all = self.sorted_workspaces()?;
        Ok(page.apply(all, |w| w.id.as_str()))
    }

    async fn workspace_list_by_user(&self, user_id: &str) -> PluraResult<Vec<Workspace>> {
        self.ensure_online()?;
        Ok(self
            .sorted_workspaces()?
            .into_iter()
            .filter(|w| w.user_id == user_id)
            .collect())
    }

    async fn workspace_create(&self, new: &NewWorkspace) -> PluraResult<Option<Workspace>> {
        self.ensure_online()?;
        new.validate()?;

        let now = Utc::now();
        let workspace = Workspace {
            id: new_record_id(),
            name: new.name.clone(),
            user_id: new.user_id.clone(),
            created_at: now,
            updated_at: now,
        };
        write(&self.workspaces)?.insert(workspace.id.clone(), workspace.clone());
        Ok(Some(workspace))
    }

    async fn workspace_delete_owned(
        &self,
        id: &str,
        owner_id: &str,
    ) -> PluraResult<Option<Workspace>> {
        self.ensure_online()?;
        let mut workspaces = write(&self.workspaces)?;
        let owned = workspaces
            .get(id)
            .map(|w| w.user_id == owner_id)
            .unwrap_or(false);
        if !owned {
            return Ok(None);
        }
        Ok(workspaces.remove(id))
    }

    async fn session_find_by_token(&self, token: &str) -> PluraResult<Option<Session>> {
        self.ensure_online()?;
        Ok(read(&self.sessions)?.get(token).cloned())
    }

    async fn health_check(&self) -> PluraResult<()> {
        self.ensure_online()?;
        Ok(())
    }
}
