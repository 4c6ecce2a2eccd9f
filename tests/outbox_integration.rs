//! Integration tests for the transactional outbox.
//!
//! These tests verify the end-to-end flow:
//! 1. Producers append entries to the event log
//! 2. The dispatch engine claims pending entries and publishes them by event type
//! 3. Entries are marked SENT, or FAILED with a retry time
//! 4. Operators page through the log and requeue exhausted entries
//!
//! Uses in-memory implementations to test the flow without external dependencies.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tokio::sync::watch;
use tower::ServiceExt;

use event_outbox::adapters::eid::{NoOpEidGenerator, RandomEidGenerator};
use event_outbox::adapters::events::{DispatchConfig, DispatchEngine, RecordingPublisher, TickOutcome};
use event_outbox::adapters::http::{event_log_router, EventLogAppState};
use event_outbox::adapters::memory::InMemoryLogStore;
use event_outbox::application::{
    RequeueEntriesCommand, RequeueEntriesHandler, SearchEntriesHandler, SearchEntriesQuery,
    SeedSnapshotCommand, SeedSnapshotHandler,
};
use event_outbox::domain::event_log::{
    BackoffPolicy, EntryStatus, EventLogEntry, EventLogError, NewLogEntry, Operation,
};
use event_outbox::domain::foundation::{LockOwner, Timestamp};
use event_outbox::ports::{
    ClaimRequest, LogStore, PublishError, PublishOutcome, UnconfiguredSnapshotProvider,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn store() -> Arc<InMemoryLogStore> {
    Arc::new(InMemoryLogStore::new(Arc::new(RandomEidGenerator)))
}

async fn append(store: &InMemoryLogStore, event_type: &str, payload: &str) -> EventLogEntry {
    store
        .append(NewLogEntry::new(event_type, Operation::Create, payload).unwrap())
        .await
        .unwrap()
}

/// Retries become eligible immediately.
fn eager_config() -> DispatchConfig {
    DispatchConfig::default().with_backoff(BackoffPolicy::Fixed(Duration::ZERO))
}

/// Retries wait long enough never to happen inside a test.
fn patient_config() -> DispatchConfig {
    DispatchConfig::default().with_backoff(BackoffPolicy::Fixed(Duration::from_secs(3600)))
}

// =============================================================================
// Append
// =============================================================================

#[tokio::test]
async fn appended_entries_get_increasing_ids_and_new_status() {
    let store = store();

    let a = append(&store, "order", r#"{"n":1}"#).await;
    let b = append(&store, "order", r#"{"n":2}"#).await;
    let c = append(&store, "invoice", r#"{"n":3}"#).await;

    assert!(a.id < b.id && b.id < c.id);
    for entry in [&a, &b, &c] {
        assert_eq!(entry.status, EntryStatus::New);
        assert_eq!(entry.attempts, 0);
        assert!(entry.last_attempt_at.is_none());
    }

    let found = store.find_by_ids(&[c.id, a.id]).await.unwrap();
    let payloads: Vec<&str> = found.iter().map(|e| e.payload.as_str()).collect();
    assert_eq!(payloads, vec![r#"{"n":1}"#, r#"{"n":3}"#]);
}

#[tokio::test]
async fn noop_generator_stamps_nil_eids() {
    let store = InMemoryLogStore::new(Arc::new(NoOpEidGenerator));

    let entry = store
        .append(NewLogEntry::new("order", Operation::Update, "{}").unwrap())
        .await
        .unwrap();

    assert!(entry.eid.is_nil());
}

#[test]
fn timestamps_round_trip_through_epoch_millis() {
    let now = Timestamp::now();
    let restored = Timestamp::from_epoch_millis(now.as_epoch_millis()).unwrap();
    assert_eq!(restored, now);
}

// =============================================================================
// Claiming
// =============================================================================

#[tokio::test]
async fn concurrent_claims_never_overlap() {
    let store = store();
    for i in 0..20 {
        append(&store, "order", &i.to_string()).await;
    }

    let first = ClaimRequest::new(LockOwner::new("node-a").unwrap(), 12, Duration::from_secs(60));
    let second = ClaimRequest::new(LockOwner::new("node-b").unwrap(), 12, Duration::from_secs(60));

    let (a, b) = tokio::join!(store.claim_batch(&first), store.claim_batch(&second));
    let (a, b) = (a.unwrap(), b.unwrap());

    let a_ids: HashSet<_> = a.iter().map(|e| e.id).collect();
    let b_ids: HashSet<_> = b.iter().map(|e| e.id).collect();
    assert!(a_ids.is_disjoint(&b_ids));
    assert_eq!(a_ids.len() + b_ids.len(), 20);
}

#[tokio::test]
async fn overlapping_ticks_on_one_engine_are_skipped() {
    let store = store();
    append(&store, "order", "{}").await;
    let publisher = Arc::new(RecordingPublisher::new().with_delay(Duration::from_millis(100)));
    let engine = DispatchEngine::with_config(store.clone(), publisher.clone(), patient_config());

    let (first, second) = tokio::join!(engine.tick(), engine.tick());
    let outcomes = [first.unwrap(), second.unwrap()];

    assert_eq!(outcomes.iter().filter(|o| o.is_skipped()).count(), 1);
    assert_eq!(publisher.call_count(), 1);
}

// =============================================================================
// Dispatch
// =============================================================================

#[tokio::test]
async fn tick_publishes_one_batch_per_event_type_in_id_order() {
    let store = store();
    let o1 = append(&store, "order", "{}").await;
    let i1 = append(&store, "invoice", "{}").await;
    let o2 = append(&store, "order", "{}").await;
    let publisher = Arc::new(RecordingPublisher::new());
    let engine = DispatchEngine::with_config(store.clone(), publisher.clone(), patient_config());

    let outcome = engine.tick().await.unwrap();

    let report = outcome.report().unwrap();
    assert_eq!(report.claimed, 3);
    assert_eq!(report.sent, 3);
    assert_eq!(report.groups, 2);

    let orders = publisher.batches_of_type("order");
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].ids, vec![o1.id, o2.id]);
    assert_eq!(publisher.batches_of_type("invoice")[0].ids, vec![i1.id]);

    let sent = store.entries_with_status(EntryStatus::Sent).await;
    assert_eq!(sent.len(), 3);
    assert!(sent.iter().all(|e| e.last_attempt_at.is_some()));
}

#[tokio::test]
async fn partial_failure_fails_only_rejected_entries() {
    let store = store();
    let e1 = append(&store, "order", "{}").await;
    let e2 = append(&store, "order", "{}").await;
    let e3 = append(&store, "order", "{}").await;
    let publisher = Arc::new(RecordingPublisher::new());
    publisher.push_response(Ok(PublishOutcome::PartiallyPublished {
        failed: vec![e2.eid],
    }));
    let engine = DispatchEngine::with_config(store.clone(), publisher.clone(), patient_config());

    engine.tick().await.unwrap();

    let entries = store.find_by_ids(&[e1.id, e2.id, e3.id]).await.unwrap();
    let statuses: Vec<EntryStatus> = entries.iter().map(|e| e.status).collect();
    assert_eq!(
        statuses,
        vec![EntryStatus::Sent, EntryStatus::Failed, EntryStatus::Sent]
    );
    assert_eq!(entries[1].attempts, 1);
    assert!(entries[1].last_error.is_some());
}

#[tokio::test]
async fn failed_entries_are_retried_after_backoff() {
    let store = store();
    let entry = append(&store, "order", "{}").await;
    let publisher = Arc::new(RecordingPublisher::new());
    publisher.push_response(Err(PublishError::transient("broker unavailable")));
    let engine = DispatchEngine::with_config(store.clone(), publisher.clone(), eager_config());

    engine.tick().await.unwrap();
    let failed = store.find_by_ids(&[entry.id]).await.unwrap();
    assert_eq!(failed[0].status, EntryStatus::Failed);
    assert_eq!(
        failed[0].last_error.as_deref(),
        Some("Transient publish failure: broker unavailable")
    );

    engine.tick().await.unwrap();
    let retried = store.find_by_ids(&[entry.id]).await.unwrap();
    assert_eq!(retried[0].status, EntryStatus::Sent);
    assert_eq!(retried[0].attempts, 1);
    assert_eq!(publisher.call_count(), 2);
}

#[tokio::test]
async fn exhausted_entries_wait_for_operator_requeue() {
    let store = store();
    let entry = append(&store, "order", "{}").await;
    let publisher = Arc::new(RecordingPublisher::new());
    publisher.push_response(Err(PublishError::permanent("schema rejected")));
    let engine = DispatchEngine::with_config(
        store.clone(),
        publisher.clone(),
        eager_config().with_max_attempts(Some(1)),
    );

    engine.tick().await.unwrap();
    let outcome = engine.tick().await.unwrap();
    assert_eq!(outcome.report().unwrap().claimed, 0);

    let result = RequeueEntriesHandler::new(store.clone())
        .handle(RequeueEntriesCommand {
            ids: vec![entry.id],
        })
        .await
        .unwrap();
    assert_eq!(result.requeued, 1);

    engine.tick().await.unwrap();
    let sent = store.find_by_ids(&[entry.id]).await.unwrap();
    assert_eq!(sent[0].status, EntryStatus::Sent);
}

#[tokio::test]
async fn run_drains_log_until_shutdown() {
    let store = store();
    for _ in 0..5 {
        append(&store, "order", "{}").await;
    }
    let publisher = Arc::new(RecordingPublisher::new());
    let engine = Arc::new(DispatchEngine::with_config(
        store.clone(),
        publisher.clone(),
        patient_config().with_poll_interval(Duration::from_millis(10)),
    ));
    let (tx, rx) = watch::channel(false);

    let runner = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.run(rx).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), runner)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(store.entries_with_status(EntryStatus::Sent).await.len(), 5);
    assert_eq!(publisher.event_count(), 5);
    assert!(matches!(engine.tick().await.unwrap(), TickOutcome::Completed(_)));
}

// =============================================================================
// Operator surface
// =============================================================================

#[tokio::test]
async fn search_pages_from_cursor() {
    let store = store();
    for i in 0..20 {
        append(&store, "order", &i.to_string()).await;
    }
    let handler = SearchEntriesHandler::new(store.clone());

    let page = handler
        .handle(SearchEntriesQuery::after("5").with_limit(10))
        .await
        .unwrap();

    let ids: Vec<i64> = page.items.iter().map(|e| e.id.as_i64()).collect();
    assert_eq!(ids, (6..=15).collect::<Vec<_>>());
    assert_eq!(page.next_cursor.map(|c| c.as_i64()), Some(15));
}

#[tokio::test]
async fn search_rejects_malformed_cursor() {
    let handler = SearchEntriesHandler::new(store());

    let result = handler.handle(SearchEntriesQuery::after("abc")).await;

    match result {
        Err(EventLogError::InvalidCursor(value)) => assert_eq!(value, "abc"),
        other => panic!("expected InvalidCursor, got {:?}", other),
    }
}

#[tokio::test]
async fn snapshot_without_provider_is_not_implemented() {
    let handler = SeedSnapshotHandler::new(store(), Arc::new(UnconfiguredSnapshotProvider));

    let result = handler
        .handle(SeedSnapshotCommand {
            event_type: "order".to_string(),
        })
        .await;

    assert!(matches!(result, Err(EventLogError::NotImplemented(_))));
}

#[tokio::test]
async fn http_api_lists_dispatched_entries() {
    let store = store();
    append(&store, "order", "{}").await;
    append(&store, "order", "{}").await;
    let engine = DispatchEngine::with_config(
        store.clone(),
        Arc::new(RecordingPublisher::new()),
        patient_config(),
    );
    engine.tick().await.unwrap();

    let app = event_log_router().with_state(EventLogAppState::new(store.clone()));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/event-log/entries?status=SENT")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["items"].as_array().unwrap().len(), 2);
    assert_eq!(json["items"][0]["status"], "SENT");
    assert!(json["next_cursor"].is_null());
}
