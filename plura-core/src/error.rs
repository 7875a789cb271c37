//! Error types for Plura operations

use thiserror::Error;

/// Data store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Query failed on {entity}: {reason}")]
    QueryFailed { entity: &'static str, reason: String },

    #[error("Insert failed for {entity}: {reason}")]
    InsertFailed { entity: &'static str, reason: String },

    #[error("Row decode failed for {entity}: {reason}")]
    DecodeFailed { entity: &'static str, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// List cache errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Cache command {command} failed: {reason}")]
    CommandFailed { command: &'static str, reason: String },

    #[error("Cache entry could not be encoded: {reason}")]
    EncodeFailed { reason: String },

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },
}

/// Master error type for all Plura errors.
#[derive(Debug, Clone, Error)]
pub enum PluraError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type alias for Plura operations.
pub type PluraResult<T> = Result<T, PluraError>;
