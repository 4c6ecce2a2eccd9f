//! Axum router configuration for event log endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{list_entries, requeue_entries, seed_snapshot, EventLogAppState};

/// Create the event log API router.
///
/// # Routes
/// - `GET /entries?cursor&status&limit` - Page through entries in id order
/// - `POST /entries/requeue` - Reset FAILED entries to NEW
/// - `POST /snapshots/:event_type` - Append a snapshot for one event type
pub fn event_log_routes() -> Router<EventLogAppState> {
    Router::new()
        .route("/entries", get(list_entries))
        .route("/entries/requeue", post(requeue_entries))
        .route("/snapshots/:event_type", post(seed_snapshot))
}

/// Create the complete event log module router, mounted at `/api/event-log`.
///
/// # Example
///
/// ```ignore
/// let app = event_log_router().with_state(EventLogAppState::new(store));
/// ```
pub fn event_log_router() -> Router<EventLogAppState> {
    Router::new().nest("/api/event-log", event_log_routes())
}
