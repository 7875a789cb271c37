//! Service layer
//!
//! Logic that sits between route handlers and the storage collaborators.

pub mod user_directory;

pub use user_directory::{UserDirectory, UserPage};
