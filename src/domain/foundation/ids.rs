//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Store-assigned, strictly increasing identifier of a log entry.
///
/// Doubles as the pagination cursor for incremental reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(i64);

impl EntryId {
    /// Creates an EntryId from a raw database value.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|e| ValidationError::invalid_format("entry_id", e.to_string()))
    }
}

/// Globally unique event identifier, used by the broker for deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Eid(Uuid);

impl Eid {
    /// Creates an Eid from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The all-zero identifier produced by the no-op generator.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Checks whether this is the all-zero identifier.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl fmt::Display for Eid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Eid {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Identity of a dispatcher holding claims on log entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockOwner(String);

impl LockOwner {
    /// Creates a LockOwner, returning error if empty.
    pub fn new(owner: impl Into<String>) -> Result<Self, ValidationError> {
        let owner = owner.into();
        if owner.trim().is_empty() {
            return Err(ValidationError::empty_field("lock_owner"));
        }
        Ok(Self(owner))
    }

    /// Creates a random owner for a dispatcher without a configured instance id.
    pub fn random() -> Self {
        Self(format!("dispatcher-{}", Uuid::new_v4()))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
