//! Cache-backed user listing.
//!
//! The listing reads through one shared list in the `ListCache`. When the
//! list is empty a single page is fetched from the `DataStore`, appended to
//! the list and given a TTL. Every later call pages over whatever that list
//! holds until it expires. Known limits of this scheme:
//!
//! - only the page that missed first is ever cached, so later pages come
//!   back short once the cached window is exhausted
//! - an unknown cursor restarts from the head of the list
//! - two cold callers can both populate the list, leaving duplicates
//! - entries are never invalidated on user writes, only by expiry

use std::sync::Arc;
use std::time::Duration;

use plura_core::{CacheError, PageRequest, PluraResult, User};
use plura_storage::{DataStore, ListCache};
use serde::{Deserialize, Serialize};

use crate::config::CacheConfig;
use crate::telemetry::metrics;

/// One page of the user listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    /// Id to pass as `cursor` for the next page; `null` once a short page
    /// is returned.
    pub next_cursor: Option<String>,
    pub users: Vec<User>,
}

/// Paginated user listing over the store and the shared cache list.
#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn DataStore>,
    cache: Arc<dyn ListCache>,
    key: String,
    ttl: Duration,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn DataStore>, cache: Arc<dyn ListCache>, config: &CacheConfig) -> Self {
        Self {
            store,
            cache,
            key: config.users_key.clone(),
            ttl: config.users_ttl,
        }
    }

    /// The cache key this directory reads and populates.
    pub fn cache_key(&self) -> &str {
        &self.key
    }

    /// Fetch the page of `take` users starting from `cursor`.
    #[tracing::instrument(skip(self), fields(key = %self.key))]
    pub async fn page(&self, cursor: Option<&str>, take: usize) -> PluraResult<UserPage> {
        let cursor = cursor.filter(|c| !c.is_empty());
        if take == 0 {
            return Ok(UserPage {
                next_cursor: None,
                users: Vec::new(),
            });
        }

        let cached_len = self.cache.len(&self.key).await?;
        if let Some(metrics) = metrics() {
            metrics.record_users_cache(cached_len > 0);
        }

        let mut users = Vec::new();
        if cached_len == 0 {
            users = self.populate(cursor, take).await?;
        }

        if users.is_empty() {
            let start = match cursor {
                Some(cursor) => self.position_after(cursor).await?,
                None => 0,
            };
            users = self.read_window(start, take).await?;
        }

        let next_cursor = if users.len() == take {
            users.last().map(|user| user.id.clone())
        } else {
            None
        };

        Ok(UserPage { next_cursor, users })
    }

    /// Fetch one page from the store and append it to the cache list.
    async fn populate(&self, cursor: Option<&str>, take: usize) -> PluraResult<Vec<User>> {
        let request = PageRequest::first(take).with_cursor(cursor.map(str::to_string));
        let users = self.store.user_find_many(&request).await?;
        tracing::debug!(fetched = users.len(), "User cache cold, populating");

        for user in &users {
            let encoded = serde_json::to_string(user).map_err(|e| CacheError::EncodeFailed {
                reason: e.to_string(),
            })?;
            self.cache.push_back(&self.key, encoded).await?;
        }
        self.cache.expire(&self.key, self.ttl).await?;

        Ok(users)
    }

    /// Index just past `cursor` in the cache list, or 0 when it is absent.
    async fn position_after(&self, cursor: &str) -> PluraResult<usize> {
        let entries = self.cache.range(&self.key, 0, -1).await?;
        let index = entries
            .iter()
            .position(|raw| decode(raw).map(|user| user.id == cursor).unwrap_or(false));

        Ok(match index {
            Some(index) => index + 1,
            None => {
                tracing::debug!(cursor, "Cursor not in user cache, restarting from head");
                0
            }
        })
    }

    async fn read_window(&self, start: usize, take: usize) -> PluraResult<Vec<User>> {
        let from = isize::try_from(start).unwrap_or(isize::MAX);
        let to = isize::try_from(start.saturating_add(take - 1)).unwrap_or(isize::MAX);
        let entries = self.cache.range(&self.key, from, to).await?;
        Ok(entries.iter().filter_map(|raw| decode(raw)).collect())
    }
}

/// Parse a cached entry, dropping it with a warning when it is not a user.
fn decode(raw: &str) -> Option<User> {
    match serde_json::from_str(raw) {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::warn!(error = %e, entry = raw, "Dropping unparsable user cache entry");
            None
        }
    }
}
