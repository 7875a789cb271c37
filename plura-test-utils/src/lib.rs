//! Plura Test Utilities
//!
//! Shared test infrastructure for the Plura workspace:
//! - Fixtures for users, workspaces and sessions with predictable ids
//! - Pre-seeded in-memory stores
//! - Proptest generators for the record types

// Re-export in-memory collaborators from their source crate
pub use plura_storage::{InMemoryDataStore, InMemoryListCache};

// Re-export core types for convenience
pub use plura_core::{PluraResult, Session, Timestamp, User, Workspace};

use chrono::{Duration, TimeZone, Utc};

/// Fixed instant all fixtures are dated from (2024-01-01T00:00:00Z).
pub fn base_time() -> Timestamp {
    Utc.timestamp_opt(1_704_067_200, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built records for common testing scenarios.

    use super::*;

    /// Zero-padded user id, so lexicographic order matches numeric order:
    /// `user_id(1) == "u01"`, `user_id(25) == "u25"`.
    pub fn user_id(n: usize) -> String {
        format!("u{:02}", n)
    }

    /// User number `n`, created `n` seconds after [`base_time`].
    pub fn user(n: usize) -> User {
        let at = base_time() + Duration::seconds(n as i64);
        User {
            id: user_id(n),
            name: format!("User {}", n),
            email: format!("user{}@plura.test", n),
            email_verified: n % 2 == 0,
            image: None,
            created_at: at,
            updated_at: at,
        }
    }

    /// Users `1..=count` in id order.
    pub fn users(count: usize) -> Vec<User> {
        (1..=count).map(user).collect()
    }

    /// Workspace owned by `owner`, created `offset_secs` after [`base_time`].
    pub fn workspace(id: &str, owner: &str, offset_secs: i64) -> Workspace {
        let at = base_time() + Duration::seconds(offset_secs);
        Workspace {
            id: id.to_string(),
            name: format!("Workspace {}", id),
            user_id: owner.to_string(),
            created_at: at,
            updated_at: at,
        }
    }

    /// Session for `user_id` that expires a day from now.
    pub fn session(token: &str, user_id: &str) -> Session {
        session_expiring(token, user_id, Utc::now() + Duration::days(1))
    }

    /// Session that lapsed an hour ago.
    pub fn expired_session(token: &str, user_id: &str) -> Session {
        session_expiring(token, user_id, Utc::now() - Duration::hours(1))
    }

    pub fn session_expiring(token: &str, user_id: &str, expires_at: Timestamp) -> Session {
        Session {
            id: format!("s-{}", token),
            token: token.to_string(),
            user_id: user_id.to_string(),
            expires_at,
        }
    }

    /// The JSON string the user listing cache stores for `user`.
    pub fn cache_entry(user: &User) -> Result<String, serde_json::Error> {
        serde_json::to_string(user)
    }
}

// ============================================================================
// SEEDED STORES
// ============================================================================

/// In-memory store holding users `u01..=u{count}`.
pub fn seeded_store(user_count: usize) -> PluraResult<InMemoryDataStore> {
    let store = InMemoryDataStore::new();
    for user in fixtures::users(user_count) {
        store.insert_user(user)?;
    }
    Ok(store)
}

/// In-memory store with `user_count` users and, for each of the first
/// `owners` users, `per_owner` workspaces `w-<owner>-<i>`.
///
/// Workspaces are created one second apart in insertion order.
pub fn seeded_store_with_workspaces(
    user_count: usize,
    owners: usize,
    per_owner: usize,
) -> PluraResult<InMemoryDataStore> {
    let store = seeded_store(user_count)?;
    let mut offset = 0;
    for n in 1..=owners.min(user_count) {
        let owner = fixtures::user_id(n);
        for i in 0..per_owner {
            offset += 1;
            let id = format!("w-{}-{}", owner, i);
            store.insert_workspace(fixtures::workspace(&id, &owner, offset))?;
        }
    }
    Ok(store)
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating Plura records.

    use super::*;
    use proptest::prelude::*;

    /// Generate a Timestamp between 2020 and 2030.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64).prop_map(|secs| {
            chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
        })
    }

    /// Generate a non-blank display name.
    pub fn arb_name() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 ]{0,31}"
    }

    /// Generate a User with the given id.
    pub fn arb_user(id: String) -> impl Strategy<Value = User> {
        (arb_name(), any::<bool>(), arb_timestamp()).prop_map(move |(name, verified, at)| User {
            id: id.clone(),
            email: format!("{}@plura.test", id),
            name,
            email_verified: verified,
            image: None,
            created_at: at,
            updated_at: at,
        })
    }

    /// Generate between `min` and `max` users with distinct, id-ordered ids.
    pub fn arb_users(min: usize, max: usize) -> impl Strategy<Value = Vec<User>> {
        (min..=max).prop_flat_map(|count| {
            (1..=count)
                .map(|n| arb_user(fixtures::user_id(n)))
                .collect::<Vec<_>>()
        })
    }

    /// Generate a page size in the accepted range.
    pub fn arb_take() -> impl Strategy<Value = usize> {
        1usize..=30
    }
}
