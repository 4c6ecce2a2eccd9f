//! In-memory PublisherClient for testing.
//!
//! Records every batch it receives and answers with scripted responses, so
//! engine behaviour under success, partial failure, errors, and slow brokers
//! can be asserted deterministically.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::domain::event_log::EventLogEntry;
use crate::domain::foundation::{Eid, EntryId};
use crate::ports::{PublishError, PublishOutcome, PublisherClient};

/// One publish call as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedBatch {
    pub event_type: String,
    pub ids: Vec<EntryId>,
    pub eids: Vec<Eid>,
}

#[derive(Default)]
struct Script {
    /// Consumed in order, one per call. Empty means `Published`.
    queued: VecDeque<Result<PublishOutcome, PublishError>>,
    /// Sticky failures by event type, checked before the queue.
    failing_types: HashMap<String, PublishError>,
}

/// Publisher that captures batches instead of sending them.
///
/// # Example
///
/// ```ignore
/// let publisher = Arc::new(RecordingPublisher::new());
/// publisher.push_response(Err(PublishError::transient("503")));
///
/// engine.tick().await?;
///
/// assert_eq!(publisher.call_count(), 1);
/// ```
#[derive(Default)]
pub struct RecordingPublisher {
    batches: Mutex<Vec<PublishedBatch>>,
    script: Mutex<Script>,
    delay: Option<Duration>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps this long inside every publish call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queues the response for the next call.
    pub fn push_response(&self, response: Result<PublishOutcome, PublishError>) {
        lock(&self.script).queued.push_back(response);
    }

    /// Fails every call for `event_type` with `error`.
    pub fn fail_event_type(&self, event_type: impl Into<String>, error: PublishError) {
        lock(&self.script)
            .failing_types
            .insert(event_type.into(), error);
    }

    // === Test Helpers ===

    /// Returns all received batches in call order.
    pub fn batches(&self) -> Vec<PublishedBatch> {
        lock(&self.batches).clone()
    }

    /// Returns batches for a specific event type.
    pub fn batches_of_type(&self, event_type: &str) -> Vec<PublishedBatch> {
        self.batches()
            .into_iter()
            .filter(|b| b.event_type == event_type)
            .collect()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.batches).len()
    }

    /// Total number of events received across calls.
    pub fn event_count(&self) -> usize {
        lock(&self.batches).iter().map(|b| b.ids.len()).sum()
    }

    pub fn clear(&self) {
        lock(&self.batches).clear();
    }
}

/// Recovers from poisoning; a panicking test must not cascade into others.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl PublisherClient for RecordingPublisher {
    async fn publish(
        &self,
        event_type: &str,
        events: &[EventLogEntry],
    ) -> Result<PublishOutcome, PublishError> {
        lock(&self.batches).push(PublishedBatch {
            event_type: event_type.to_string(),
            ids: events.iter().map(|e| e.id).collect(),
            eids: events.iter().map(|e| e.eid).collect(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut script = lock(&self.script);
        if let Some(error) = script.failing_types.get(event_type) {
            return Err(error.clone());
        }
        script
            .queued
            .pop_front()
            .unwrap_or(Ok(PublishOutcome::Published))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event_log::{NewLogEntry, Operation};
    use crate::domain::foundation::Timestamp;
    use uuid::Uuid;

    fn entry(id: i64, event_type: &str) -> EventLogEntry {
        EventLogEntry::new(
            EntryId::new(id),
            Eid::from_uuid(Uuid::new_v4()),
            NewLogEntry::new(event_type, Operation::Update, "{}").unwrap(),
            Timestamp::now(),
        )
    }

    #[tokio::test]
    async fn records_batches_and_defaults_to_published() {
        let publisher = RecordingPublisher::new();
        let events = vec![entry(1, "order"), entry(2, "order")];

        let outcome = publisher.publish("order", &events).await.unwrap();

        assert_eq!(outcome, PublishOutcome::Published);
        assert_eq!(publisher.call_count(), 1);
        assert_eq!(publisher.event_count(), 2);
        assert_eq!(publisher.batches()[0].ids, vec![EntryId::new(1), EntryId::new(2)]);
    }

    #[tokio::test]
    async fn queued_responses_are_consumed_in_order() {
        let publisher = RecordingPublisher::new();
        publisher.push_response(Err(PublishError::transient("503")));
        let events = vec![entry(1, "order")];

        assert!(publisher.publish("order", &events).await.is_err());
        assert!(publisher.publish("order", &events).await.is_ok());
    }

    #[tokio::test]
    async fn failing_event_type_is_sticky() {
        let publisher = RecordingPublisher::new();
        publisher.fail_event_type("invoice", PublishError::permanent("rejected"));

        for _ in 0..2 {
            let err = publisher
                .publish("invoice", &[entry(1, "invoice")])
                .await
                .unwrap_err();
            assert!(!err.is_transient());
        }
        assert!(publisher.publish("order", &[entry(2, "order")]).await.is_ok());
        assert_eq!(publisher.batches_of_type("invoice").len(), 2);
    }
}
