//! In-memory LogStore for tests and local development.
//!
//! All operations run under one `tokio::sync::Mutex`, so a claim is as atomic
//! as the single UPDATE statement of the PostgreSQL store. Eid uniqueness is
//! not enforced, which lets tests use `NoOpEidGenerator`.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::event_log::{EntryStatus, EventLogEntry, NewLogEntry, SearchQuery};
use crate::domain::foundation::{DomainError, EntryId, LockOwner, Timestamp};
use crate::ports::{ClaimRequest, EidGenerator, FailedDelivery, LogStore};

#[derive(Default)]
struct State {
    /// Kept in ascending id order.
    entries: Vec<EventLogEntry>,
    last_id: i64,
}

impl State {
    fn get_mut(&mut self, id: EntryId) -> Option<&mut EventLogEntry> {
        self.entries
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(move |idx| &mut self.entries[idx])
    }
}

/// In-memory event log.
///
/// # Example
///
/// ```ignore
/// let store = InMemoryLogStore::new(Arc::new(RandomEidGenerator));
/// store.append(NewLogEntry::new("order", Operation::Create, "{}")?).await?;
/// assert_eq!(store.len().await, 1);
/// ```
pub struct InMemoryLogStore {
    state: Mutex<State>,
    eid_generator: Arc<dyn EidGenerator>,
}

impl InMemoryLogStore {
    pub fn new(eid_generator: Arc<dyn EidGenerator>) -> Self {
        Self {
            state: Mutex::new(State::default()),
            eid_generator,
        }
    }

    // === Test Helpers ===

    /// Returns every entry in id order.
    pub async fn entries(&self) -> Vec<EventLogEntry> {
        self.state.lock().await.entries.clone()
    }

    /// Returns entries with the given status.
    pub async fn entries_with_status(&self, status: EntryStatus) -> Vec<EventLogEntry> {
        self.state
            .lock()
            .await
            .entries
            .iter()
            .filter(|e| e.status == status)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl LogStore for InMemoryLogStore {
    async fn append(&self, entry: NewLogEntry) -> Result<EventLogEntry, DomainError> {
        let eid = self.eid_generator.generate();
        let mut state = self.state.lock().await;
        state.last_id += 1;
        let appended = EventLogEntry::new(EntryId::new(state.last_id), eid, entry, Timestamp::now());
        state.entries.push(appended.clone());
        Ok(appended)
    }

    async fn claim_batch(&self, request: &ClaimRequest) -> Result<Vec<EventLogEntry>, DomainError> {
        let now = Timestamp::now();
        let until = now.plus(request.lease);
        let mut state = self.state.lock().await;

        let claimed: Vec<EventLogEntry> = state
            .entries
            .iter_mut()
            .filter(|e| e.is_claimable_at(&now, request.max_attempts))
            .take(request.limit as usize)
            .map(|e| {
                e.claim(request.owner.clone(), until);
                e.clone()
            })
            .collect();

        Ok(claimed)
    }

    async fn mark_sent(&self, owner: &LockOwner, ids: &[EntryId]) -> Result<u64, DomainError> {
        let now = Timestamp::now();
        let mut state = self.state.lock().await;
        let mut affected = 0;

        for id in ids {
            if let Some(entry) = state.get_mut(*id) {
                if entry.is_held_by(owner) && entry.mark_sent(now).is_ok() {
                    affected += 1;
                }
            }
        }

        Ok(affected)
    }

    async fn mark_failed(
        &self,
        owner: &LockOwner,
        failures: &[FailedDelivery],
    ) -> Result<u64, DomainError> {
        let now = Timestamp::now();
        let mut state = self.state.lock().await;
        let mut affected = 0;

        for failure in failures {
            if let Some(entry) = state.get_mut(failure.id) {
                if entry.is_held_by(owner)
                    && entry
                        .mark_failed(now, now.plus(failure.retry_after), failure.reason.clone())
                        .is_ok()
                {
                    affected += 1;
                }
            }
        }

        Ok(affected)
    }

    async fn release_claims(&self, owner: &LockOwner) -> Result<u64, DomainError> {
        let mut state = self.state.lock().await;
        let mut affected = 0;

        for entry in state.entries.iter_mut().filter(|e| e.is_held_by(owner)) {
            entry.release();
            affected += 1;
        }

        Ok(affected)
    }

    async fn release_entries(
        &self,
        owner: &LockOwner,
        ids: &[EntryId],
    ) -> Result<u64, DomainError> {
        let mut state = self.state.lock().await;
        let mut affected = 0;

        for id in ids {
            if let Some(entry) = state.get_mut(*id) {
                if entry.is_held_by(owner) {
                    entry.release();
                    affected += 1;
                }
            }
        }

        Ok(affected)
    }

    async fn requeue(&self, ids: &[EntryId]) -> Result<u64, DomainError> {
        let now = Timestamp::now();
        let mut state = self.state.lock().await;
        let mut affected = 0;

        for id in ids {
            if let Some(entry) = state.get_mut(*id) {
                if entry.status == EntryStatus::Failed
                    && !entry.is_claimed_at(&now)
                    && entry.requeue().is_ok()
                {
                    affected += 1;
                }
            }
        }

        Ok(affected)
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<EventLogEntry>, DomainError> {
        let state = self.state.lock().await;
        Ok(state
            .entries
            .iter()
            .filter(|e| query.matches(e.id, e.status))
            .take(query.limit.get() as usize)
            .cloned()
            .collect())
    }

    async fn find_by_ids(&self, ids: &[EntryId]) -> Result<Vec<EventLogEntry>, DomainError> {
        let state = self.state.lock().await;
        Ok(state
            .entries
            .iter()
            .filter(|e| ids.contains(&e.id))
            .cloned()
            .collect())
    }
}
