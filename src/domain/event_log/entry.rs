//! EventLogEntry - the persisted record of one event.

use serde::{Deserialize, Serialize};

use super::{EntryStatus, Operation};
use crate::domain::foundation::{
    Eid, EntryId, LockOwner, StateMachine, Timestamp, ValidationError,
};

/// Data the producer supplies when appending an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogEntry {
    pub event_type: String,
    pub operation: Operation,
    pub payload: String,
}

impl NewLogEntry {
    /// Creates a new entry request, rejecting a blank event type.
    pub fn new(
        event_type: impl Into<String>,
        operation: Operation,
        payload: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let event_type = event_type.into();
        if event_type.trim().is_empty() {
            return Err(ValidationError::empty_field("event_type"));
        }
        Ok(Self {
            event_type,
            operation,
            payload: payload.into(),
        })
    }
}

/// An entry in the event log table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLogEntry {
    /// Store-assigned, strictly increasing id
    pub id: EntryId,

    /// Deduplication id, fixed at append time
    pub eid: Eid,

    /// Logical stream the event belongs to
    pub event_type: String,

    pub operation: Operation,

    /// Opaque producer data
    pub payload: String,

    pub status: EntryStatus,

    /// Number of failed publish attempts
    pub attempts: u32,

    pub created_at: Timestamp,

    /// When the entry was last handed to the broker
    pub last_attempt_at: Option<Timestamp>,

    /// Earliest instant a FAILED entry may be claimed again
    pub next_attempt_at: Option<Timestamp>,

    pub last_error: Option<String>,

    pub lock_owner: Option<LockOwner>,

    pub locked_until: Option<Timestamp>,
}

impl EventLogEntry {
    /// Materializes a freshly appended entry.
    pub fn new(id: EntryId, eid: Eid, new: NewLogEntry, created_at: Timestamp) -> Self {
        Self {
            id,
            eid,
            event_type: new.event_type,
            operation: new.operation,
            payload: new.payload,
            status: EntryStatus::New,
            attempts: 0,
            created_at,
            last_attempt_at: None,
            next_attempt_at: None,
            last_error: None,
            lock_owner: None,
            locked_until: None,
        }
    }

    /// True while an unexpired claim is held on this entry.
    pub fn is_claimed_at(&self, now: &Timestamp) -> bool {
        self.locked_until
            .map(|until| until.is_after(now))
            .unwrap_or(false)
    }

    /// True if the given owner holds (or last held) the claim.
    pub fn is_held_by(&self, owner: &LockOwner) -> bool {
        self.lock_owner.as_ref() == Some(owner)
    }

    /// Retry-eligibility rule shared by every store.
    ///
    /// NEW entries are claimable when unlocked. FAILED entries additionally
    /// wait for `next_attempt_at` and stop being claimable once `max_attempts`
    /// is reached.
    pub fn is_claimable_at(&self, now: &Timestamp, max_attempts: Option<u32>) -> bool {
        if self.is_claimed_at(now) {
            return false;
        }
        match self.status {
            EntryStatus::New => true,
            EntryStatus::Sent => false,
            EntryStatus::Failed => {
                let due = self
                    .next_attempt_at
                    .map(|at| !at.is_after(now))
                    .unwrap_or(true);
                let budget_left = max_attempts.map(|max| self.attempts < max).unwrap_or(true);
                due && budget_left
            }
        }
    }

    /// Records a claim by `owner` valid until `until`.
    pub fn claim(&mut self, owner: LockOwner, until: Timestamp) {
        self.lock_owner = Some(owner);
        self.locked_until = Some(until);
    }

    /// Clears the claim markers.
    pub fn release(&mut self) {
        self.lock_owner = None;
        self.locked_until = None;
    }

    /// Marks the entry as acknowledged by the broker.
    pub fn mark_sent(&mut self, now: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(EntryStatus::Sent)?;
        self.last_attempt_at = Some(now);
        self.next_attempt_at = None;
        self.last_error = None;
        self.release();
        Ok(())
    }

    /// Marks a failed attempt and schedules the next one.
    pub fn mark_failed(
        &mut self,
        now: Timestamp,
        retry_at: Timestamp,
        reason: impl Into<String>,
    ) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(EntryStatus::Failed)?;
        self.attempts = self.attempts.saturating_add(1);
        self.last_attempt_at = Some(now);
        self.next_attempt_at = Some(retry_at);
        self.last_error = Some(reason.into());
        self.release();
        Ok(())
    }

    /// Operator reset of a FAILED entry back to NEW with a fresh budget.
    pub fn requeue(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(EntryStatus::New)?;
        self.attempts = 0;
        self.next_attempt_at = None;
        self.last_error = None;
        self.release();
        Ok(())
    }
}
