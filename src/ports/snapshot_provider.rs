//! SnapshotProvider port - Current-state snapshots for replay and bootstrap.
//!
//! A consumer joining late asks for a snapshot instead of the full history.
//! The provider pages through domain state by key; each state is appended to
//! the log as a SNAPSHOT entry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::DomainError;

/// One domain state produced for a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotState {
    /// Stable ordering key, used as the paging cursor
    pub key: String,

    /// Serialized state
    pub payload: String,
}

impl SnapshotState {
    pub fn new(key: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            payload: payload.into(),
        }
    }
}

/// Port for supplying snapshots on demand.
///
/// There is no useful default: an application that never provides one gets
/// `NOT_IMPLEMENTED` the first time a snapshot is requested.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Next page of states for `event_type` strictly after `after`.
    ///
    /// Keys are opaque to the caller and follow whatever order the provider
    /// defines. An empty page ends the snapshot.
    async fn produce_snapshot(
        &self,
        event_type: &str,
        after: Option<&str>,
    ) -> Result<Vec<SnapshotState>, DomainError> {
        let _ = (event_type, after);
        Err(DomainError::not_implemented("SnapshotProvider::produce_snapshot"))
    }
}

/// Placeholder wired in when the application supplies no provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredSnapshotProvider;

impl SnapshotProvider for UnconfiguredSnapshotProvider {}
