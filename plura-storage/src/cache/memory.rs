//! Process-local list cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use plura_core::{CacheError, PluraResult};
use tokio::time::Instant;

use super::traits::ListCache;

#[derive(Debug, Default)]
struct ListEntry {
    items: Vec<String>,
    expires_at: Option<Instant>,
}

impl ListEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

/// In-memory `ListCache` with Redis list semantics.
///
/// Expiry is measured with `tokio::time::Instant`, so a paused tokio clock
/// controls it in tests. Expired keys are dropped lazily on access.
#[derive(Debug, Default, Clone)]
pub struct InMemoryListCache {
    lists: Arc<Mutex<HashMap<String, ListEntry>>>,
}

impl InMemoryListCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, ListEntry>>, CacheError> {
        let mut lists = self.lists.lock().map_err(|_| CacheError::LockPoisoned)?;
        let now = Instant::now();
        lists.retain(|_, entry| !entry.is_expired(now));
        Ok(lists)
    }
}

/// Resolve `LRANGE` bounds against a list of `len` elements.
fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let len = len as isize;
    let start = if start < 0 { (start + len).max(0) } else { start };
    let stop = if stop < 0 { stop + len } else { stop.min(len - 1) };
    if start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

#[async_trait]
impl ListCache for InMemoryListCache {
    async fn len(&self, key: &str) -> PluraResult<usize> {
        Ok(self.lock()?.get(key).map(|e| e.items.len()).unwrap_or(0))
    }

    async fn push_back(&self, key: &str, value: String) -> PluraResult<usize> {
        let mut lists = self.lock()?;
        let entry = lists.entry(key.to_string()).or_default();
        entry.items.push(value);
        Ok(entry.items.len())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> PluraResult<bool> {
        let mut lists = self.lock()?;
        match lists.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn range(&self, key: &str, start: isize, stop: isize) -> PluraResult<Vec<String>> {
        let lists = self.lock()?;
        let Some(entry) = lists.get(key) else {
            return Ok(Vec::new());
        };
        Ok(match resolve_range(entry.items.len(), start, stop) {
            Some((from, to)) => entry.items[from..=to].to_vec(),
            None => Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    async fn seeded(n: usize) -> PluraResult<InMemoryListCache> {
        let cache = InMemoryListCache::new();
        for i in 0..n {
            cache.push_back("k", format!("v{}", i)).await?;
        }
        Ok(cache)
    }

    #[tokio::test]
    async fn test_missing_key_is_empty() -> PluraResult<()> {
        let cache = InMemoryListCache::new();
        assert_eq!(cache.len("k").await?, 0);
        assert!(cache.range("k", 0, -1).await?.is_empty());
        assert!(!cache.expire("k", Duration::from_secs(1)).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_push_back_appends_in_order() -> PluraResult<()> {
        let cache = seeded(3).await?;
        assert_eq!(cache.len("k").await?, 3);
        assert_eq!(cache.range("k", 0, -1).await?, vec!["v0", "v1", "v2"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_range_clamps_out_of_bounds() -> PluraResult<()> {
        let cache = seeded(3).await?;
        assert_eq!(cache.range("k", 1, 100).await?, vec!["v1", "v2"]);
        assert!(cache.range("k", 5, 10).await?.is_empty());
        assert_eq!(cache.range("k", -2, -1).await?, vec!["v1", "v2"]);
        assert_eq!(cache.range("k", -100, 0).await?, vec!["v0"]);
        assert!(cache.range("k", 2, 1).await?.is_empty());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_drops_key_after_ttl() -> PluraResult<()> {
        let cache = seeded(2).await?;
        assert!(cache.expire("k", Duration::from_secs(600)).await?);

        tokio::time::advance(Duration::from_secs(599)).await;
        assert_eq!(cache.len("k").await?, 2);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.len("k").await?, 0);

        // A fresh push after expiry starts a new list without a TTL.
        cache.push_back("k", "again".to_string()).await?;
        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(cache.len("k").await?, 1);
        Ok(())
    }

    proptest! {
        #[test]
        fn prop_resolve_range_stays_in_bounds(len in 0usize..50, start in -60isize..60, stop in -60isize..60) {
            if let Some((from, to)) = resolve_range(len, start, stop) {
                prop_assert!(from <= to);
                prop_assert!(to < len);
            }
        }

        #[test]
        fn prop_full_range_returns_everything(len in 1usize..50) {
            prop_assert_eq!(resolve_range(len, 0, -1), Some((0, len - 1)));
        }
    }
}
