//! Redis-backed list cache.

use std::time::Duration;

use async_trait::async_trait;
use plura_core::{CacheError, PluraResult};
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};

use super::traits::ListCache;

fn command_error(command: &'static str) -> impl FnOnce(RedisError) -> CacheError {
    move |err| {
        tracing::error!(command, error = %err, "Redis command failed");
        CacheError::CommandFailed {
            command,
            reason: err.to_string(),
        }
    }
}

/// `ListCache` over Redis lists (`LLEN`, `RPUSH`, `EXPIRE`, `LRANGE`).
///
/// Holds a `ConnectionManager`, which reconnects on failure and is cheap
/// to clone per command.
#[derive(Clone)]
pub struct RedisListCache {
    manager: ConnectionManager,
}

impl RedisListCache {
    /// Connect to the Redis server at `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> PluraResult<Self> {
        let client = Client::open(url).map_err(|e| CacheError::ConnectionFailed {
            reason: e.to_string(),
        })?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::ConnectionFailed {
                reason: e.to_string(),
            })?;
        tracing::info!("Connected to Redis list cache");
        Ok(Self { manager })
    }

    pub fn from_manager(manager: ConnectionManager) -> Self {
        Self { manager }
    }
}

impl std::fmt::Debug for RedisListCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisListCache").finish_non_exhaustive()
    }
}

#[async_trait]
impl ListCache for RedisListCache {
    async fn len(&self, key: &str) -> PluraResult<usize> {
        let mut conn = self.manager.clone();
        let len: usize = conn.llen(key).await.map_err(command_error("LLEN"))?;
        Ok(len)
    }

    async fn push_back(&self, key: &str, value: String) -> PluraResult<usize> {
        let mut conn = self.manager.clone();
        let len: usize = conn
            .rpush(key, value)
            .await
            .map_err(command_error("RPUSH"))?;
        Ok(len)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> PluraResult<bool> {
        let mut conn = self.manager.clone();
        let seconds = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let applied: bool = conn
            .expire(key, seconds)
            .await
            .map_err(command_error("EXPIRE"))?;
        Ok(applied)
    }

    async fn range(&self, key: &str, start: isize, stop: isize) -> PluraResult<Vec<String>> {
        let mut conn = self.manager.clone();
        let items: Vec<String> = conn
            .lrange(key, start, stop)
            .await
            .map_err(command_error("LRANGE"))?;
        Ok(items)
    }
}
