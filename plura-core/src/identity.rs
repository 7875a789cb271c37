//! Identity types for Plura records

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Record identifier.
///
/// Records created by the auth provider carry opaque string ids, so ids are
/// kept as strings end to end. Ids minted by this service are UUIDv7
/// strings and therefore sort by creation time.
pub type RecordId = String;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 record id.
pub fn new_record_id() -> RecordId {
    Uuid::now_v7().to_string()
}
