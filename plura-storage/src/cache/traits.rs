//! List cache backend trait.

use std::time::Duration;

use async_trait::async_trait;
use plura_core::PluraResult;

/// Cache backend exposing list operations.
///
/// # Index semantics
///
/// `range` follows Redis `LRANGE`: both bounds are inclusive, negative
/// indices count from the tail (`-1` is the last element), and out-of-range
/// bounds are clamped rather than rejected. A missing or expired key
/// behaves as an empty list everywhere.
#[async_trait]
pub trait ListCache: Send + Sync {
    /// Number of elements in the list at `key`.
    async fn len(&self, key: &str) -> PluraResult<usize>;

    /// Append `value` to the tail of the list, creating it if absent.
    /// Returns the new length.
    async fn push_back(&self, key: &str, value: String) -> PluraResult<usize>;

    /// Expire `key` after `ttl`. Returns `false` when the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> PluraResult<bool>;

    /// Elements from `start` to `stop`, inclusive.
    async fn range(&self, key: &str, start: isize, stop: isize) -> PluraResult<Vec<String>>;
}
