//! Cursor-based pagination over the log.
//!
//! The cursor is the last `id` a reader has seen; a page holds entries with
//! `id > cursor` in ascending order.

use super::{EntryStatus, EventLogError};
use crate::domain::foundation::{EntryId, ValidationError};

/// Exclusive lower bound on entry ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Cursor(i64);

impl Cursor {
    /// Cursor reading from the first entry.
    pub fn start() -> Self {
        Self(0)
    }

    /// Cursor reading entries after `id`.
    pub fn after(id: EntryId) -> Self {
        Self(id.as_i64().max(0))
    }

    /// Parses a client-supplied cursor.
    ///
    /// Absent, empty, and `null` mean "from the start". Anything that is not a
    /// non-negative integer is rejected with the offending value embedded.
    pub fn parse(raw: Option<&str>) -> Result<Self, EventLogError> {
        let value = match raw.map(str::trim) {
            None | Some("") | Some("null") => return Ok(Self::start()),
            Some(value) => value,
        };
        match value.parse::<i64>() {
            Ok(n) if n >= 0 => Ok(Self(n)),
            _ => Err(EventLogError::invalid_cursor(raw.unwrap_or_default())),
        }
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// Maximum number of entries returned by one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimit(u32);

impl PageLimit {
    pub const DEFAULT: u32 = 100;
    pub const MAX: u32 = 1000;

    /// Creates a limit in `1..=MAX`.
    pub fn new(limit: u32) -> Result<Self, ValidationError> {
        if limit == 0 || limit > Self::MAX {
            return Err(ValidationError::out_of_range(
                "limit",
                1,
                i64::from(Self::MAX),
                i64::from(limit),
            ));
        }
        Ok(Self(limit))
    }

    /// Parses a client-supplied limit. Absent or blank means the default.
    pub fn parse(raw: Option<&str>) -> Result<Self, ValidationError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(value) => value
                .parse::<u32>()
                .map_err(|_| {
                    ValidationError::invalid_format(
                        "limit",
                        format!("expected a positive integer, got '{}'", value),
                    )
                })
                .and_then(Self::new),
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for PageLimit {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// A validated search over the log.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    pub cursor: Cursor,
    pub status: Option<EntryStatus>,
    pub limit: PageLimit,
}

impl SearchQuery {
    pub fn new(cursor: Cursor, status: Option<EntryStatus>, limit: PageLimit) -> Self {
        Self {
            cursor,
            status,
            limit,
        }
    }

    /// Returns true if the entry falls inside this query's window filter.
    pub fn matches(&self, id: EntryId, status: EntryStatus) -> bool {
        id.as_i64() > self.cursor.as_i64() && self.status.map(|s| s == status).unwrap_or(true)
    }
}
