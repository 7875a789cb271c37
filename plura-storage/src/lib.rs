//! Plura Storage - Collaborator Contracts
//!
//! Defines the two collaborators the API talks to:
//! - `DataStore`: typed record queries (users, workspaces, sessions)
//! - `ListCache`: a key-value store exposing list primitives with expiry
//!
//! Each contract ships an in-memory implementation for tests and local
//! development. The list cache also has a Redis implementation; the SQL
//! data store lives in the API crate next to its connection pool.

pub mod cache;
pub mod data_store;
pub mod memory;

pub use cache::{InMemoryListCache, ListCache, RedisListCache};
pub use data_store::DataStore;
pub use memory::InMemoryDataStore;
