//! HTTP adapter for event log endpoints.
//!
//! Exposes the event log for audit and operations:
//! - `GET /api/event-log/entries` - Cursor-paginated entries
//! - `POST /api/event-log/entries/requeue` - Requeue FAILED entries
//! - `POST /api/event-log/snapshots/:event_type` - Seed a snapshot

mod dto;
mod handlers;
mod routes;

pub use dto::{
    EntryPageResponse, EntryResponse, ErrorResponse, ListEntriesParams, RequeueRequest,
    RequeueResponse, SnapshotResponse,
};
pub use handlers::{EventLogApiError, EventLogAppState};
pub use routes::{event_log_router, event_log_routes};
