//! LogStore port - Interface for the transactional outbox table.
//!
//! This port implements the storage half of the Transactional Outbox Pattern:
//! events are appended in the same transaction as domain changes, then
//! claimed, published, and marked by the dispatch engine.
//!
//! ## Claiming
//!
//! `claim_batch` is the only mutual-exclusion mechanism between dispatcher
//! instances. It must select claimable rows in id order, skip rows already
//! claimed by someone else instead of waiting on them, and stamp the winners
//! with a lease. A claim whose lease has expired is claimable again.
//!
//! ## Marking
//!
//! `mark_sent` / `mark_failed` only touch rows whose claim is still held by
//! the given owner. A dispatcher that lost its lease therefore cannot
//! overwrite the outcome of the dispatcher that took over.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::event_log::{EventLogEntry, NewLogEntry, SearchQuery};
use crate::domain::foundation::{DomainError, EntryId, LockOwner};

/// Parameters of one claim.
#[derive(Debug, Clone)]
pub struct ClaimRequest {
    /// Who is claiming
    pub owner: LockOwner,

    /// Maximum number of entries to claim
    pub limit: u32,

    /// How long the claim stays valid
    pub lease: Duration,

    /// FAILED entries with this many attempts are no longer claimed
    pub max_attempts: Option<u32>,
}

impl ClaimRequest {
    pub fn new(owner: LockOwner, limit: u32, lease: Duration) -> Self {
        Self {
            owner,
            limit,
            lease,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// One entry whose publish attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDelivery {
    pub id: EntryId,

    /// Backoff before the entry becomes claimable again
    pub retry_after: Duration,

    pub reason: String,
}

impl FailedDelivery {
    pub fn new(id: EntryId, retry_after: Duration, reason: impl Into<String>) -> Self {
        Self {
            id,
            retry_after,
            reason: reason.into(),
        }
    }
}

/// Port for the event log table.
///
/// # Example
///
/// ```ignore
/// // In a command handler (PostgreSQL store):
/// let mut txn = pool.begin().await?;
/// order_repo.save_in_txn(&order, &mut txn).await?;
/// log_store
///     .append_in_txn(&mut txn, NewLogEntry::new("order.created", Operation::Create, payload)?)
///     .await?;
/// txn.commit().await?;
/// ```
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Append a NEW entry with a freshly generated eid.
    ///
    /// Fails with `PERSISTENCE_ERROR` if the write fails; the caller's
    /// enclosing transaction must then roll back.
    async fn append(&self, entry: NewLogEntry) -> Result<EventLogEntry, DomainError>;

    /// Atomically claim up to `request.limit` claimable entries in id order.
    async fn claim_batch(&self, request: &ClaimRequest) -> Result<Vec<EventLogEntry>, DomainError>;

    /// Mark entries held by `owner` as SENT. Returns rows affected.
    async fn mark_sent(&self, owner: &LockOwner, ids: &[EntryId]) -> Result<u64, DomainError>;

    /// Mark entries held by `owner` as FAILED. Returns rows affected.
    async fn mark_failed(
        &self,
        owner: &LockOwner,
        failures: &[FailedDelivery],
    ) -> Result<u64, DomainError>;

    /// Drop every claim held by `owner` without changing status.
    async fn release_claims(&self, owner: &LockOwner) -> Result<u64, DomainError>;

    /// Drop `owner`'s claims on `ids` without changing status.
    async fn release_entries(&self, owner: &LockOwner, ids: &[EntryId])
        -> Result<u64, DomainError>;

    /// Reset FAILED entries to NEW with a fresh attempt budget.
    ///
    /// Entries under a live claim are left alone.
    async fn requeue(&self, ids: &[EntryId]) -> Result<u64, DomainError>;

    /// Entries with `id > cursor`, optionally filtered by status, ascending.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<EventLogEntry>, DomainError>;

    /// Point lookup. Unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[EntryId]) -> Result<Vec<EventLogEntry>, DomainError>;
}
