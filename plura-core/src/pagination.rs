//! Cursor pagination requests

use serde::{Deserialize, Serialize};

use crate::identity::RecordId;

/// Page size used when a caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A cursor page request in store-native terms.
///
/// The cursor record itself is the first candidate of the page; `skip`
/// drops that many leading records (so `skip = 1` with a cursor yields the
/// records strictly after it). A cursor that does not name an existing
/// record yields an empty page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub take: usize,
    pub cursor: Option<RecordId>,
    pub skip: usize,
}

impl PageRequest {
    /// First page of `take` records.
    pub fn first(take: usize) -> Self {
        Self {
            take,
            cursor: None,
            skip: 0,
        }
    }

    /// Attach a cursor. Empty cursors are treated as no cursor.
    pub fn with_cursor(mut self, cursor: Option<RecordId>) -> Self {
        self.cursor = cursor.filter(|c| !c.is_empty());
        self
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Apply this request to records already sorted in page order.
    ///
    /// Shared by in-memory stores so they agree with the SQL store.
    pub fn apply<T, F>(&self, sorted: Vec<T>, id_of: F) -> Vec<T>
    where
        F: Fn(&T) -> &str,
    {
        let start = match &self.cursor {
            Some(cursor) => match sorted.iter().position(|item| id_of(item) == cursor) {
                Some(index) => index,
                None => return Vec::new(),
            },
            None => 0,
        };

        sorted
            .into_iter()
            .skip(start + self.skip)
            .take(self.take)
            .collect()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}
