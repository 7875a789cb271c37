//! List cache
//!
//! A key-value store exposing list primitives (append, length, range read)
//! and key expiry. Used as a short-lived denormalized index for listing
//! endpoints.
//!
//! Two backends:
//! - `InMemoryListCache`: process-local, for tests and single-node dev
//! - `RedisListCache`: shared, backed by Redis lists

mod memory;
mod redis_list;
mod traits;

pub use memory::InMemoryListCache;
pub use redis_list::RedisListCache;
pub use traits::ListCache;
