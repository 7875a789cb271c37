//! Plura Core - Records and Errors
//!
//! Pure data structures shared by every Plura crate: the `User`,
//! `Workspace` and `Session` records, the cursor pagination request, and
//! the error taxonomy. This crate contains no I/O.

pub mod entities;
pub mod error;
pub mod identity;
pub mod pagination;

pub use entities::{NewWorkspace, Session, User, Workspace};
pub use error::{CacheError, PluraError, PluraResult, StorageError, ValidationError};
pub use identity::{new_record_id, RecordId, Timestamp};
pub use pagination::{PageRequest, DEFAULT_PAGE_SIZE};
