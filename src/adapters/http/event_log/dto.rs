//! Data transfer objects for event log endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::event_log::{
    EntryPage, RequeueEntriesResult, SeedSnapshotResult,
};
use crate::domain::event_log::{EntryStatus, EventLogEntry, Operation};
use crate::domain::foundation::Timestamp;

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

/// Query string of `GET /entries`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListEntriesParams {
    pub cursor: Option<String>,
    pub status: Option<String>,
    pub limit: Option<String>,
}

/// Body of `POST /entries/requeue`.
#[derive(Debug, Clone, Deserialize)]
pub struct RequeueRequest {
    pub ids: Vec<i64>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════════

/// One log entry as exposed over HTTP.
#[derive(Debug, Clone, Serialize)]
pub struct EntryResponse {
    pub id: i64,
    pub eid: String,
    pub event_type: String,
    pub operation: Operation,
    pub payload: String,
    pub status: EntryStatus,
    pub created_at: Timestamp,
    pub last_attempt_at: Option<Timestamp>,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl From<EventLogEntry> for EntryResponse {
    fn from(entry: EventLogEntry) -> Self {
        Self {
            id: entry.id.as_i64(),
            eid: entry.eid.to_string(),
            event_type: entry.event_type,
            operation: entry.operation,
            payload: entry.payload,
            status: entry.status,
            created_at: entry.created_at,
            last_attempt_at: entry.last_attempt_at,
            attempts: entry.attempts,
            last_error: entry.last_error,
        }
    }
}

/// One page of entries.
#[derive(Debug, Clone, Serialize)]
pub struct EntryPageResponse {
    pub items: Vec<EntryResponse>,
    /// Pass back as `cursor` to read the next page; absent on the last page.
    pub next_cursor: Option<String>,
}

impl From<EntryPage> for EntryPageResponse {
    fn from(page: EntryPage) -> Self {
        Self {
            items: page.items.into_iter().map(EntryResponse::from).collect(),
            next_cursor: page.next_cursor.map(|id| id.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RequeueResponse {
    pub requested: usize,
    pub requeued: u64,
}

impl From<RequeueEntriesResult> for RequeueResponse {
    fn from(result: RequeueEntriesResult) -> Self {
        Self {
            requested: result.requested,
            requeued: result.requeued,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotResponse {
    pub event_type: String,
    pub appended: usize,
    pub first_entry_id: Option<i64>,
    pub last_entry_id: Option<i64>,
}

impl From<SeedSnapshotResult> for SnapshotResponse {
    fn from(result: SeedSnapshotResult) -> Self {
        Self {
            event_type: result.event_type,
            appended: result.appended,
            first_entry_id: result.first_entry_id.map(|id| id.as_i64()),
            last_entry_id: result.last_entry_id.map(|id| id.as_i64()),
        }
    }
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error_code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}
