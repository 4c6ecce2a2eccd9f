//! HTTP handlers for event log endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use crate::application::handlers::event_log::{
    RequeueEntriesCommand, RequeueEntriesHandler, SearchEntriesHandler, SearchEntriesQuery,
    SeedSnapshotCommand, SeedSnapshotHandler,
};
use crate::domain::event_log::EventLogError;
use crate::domain::foundation::{DomainError, EntryId};
use crate::ports::{LogStore, SnapshotProvider, UnconfiguredSnapshotProvider};

use super::dto::{
    EntryPageResponse, ErrorResponse, ListEntriesParams, RequeueRequest, RequeueResponse,
    SnapshotResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for event log endpoints.
#[derive(Clone)]
pub struct EventLogAppState {
    pub store: Arc<dyn LogStore>,
    pub snapshot_provider: Arc<dyn SnapshotProvider>,
}

impl EventLogAppState {
    /// State without a snapshot provider; snapshot requests answer 501.
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self {
            store,
            snapshot_provider: Arc::new(UnconfiguredSnapshotProvider),
        }
    }

    pub fn with_snapshot_provider(mut self, provider: Arc<dyn SnapshotProvider>) -> Self {
        self.snapshot_provider = provider;
        self
    }

    pub fn search_entries_handler(&self) -> SearchEntriesHandler {
        SearchEntriesHandler::new(self.store.clone())
    }

    pub fn requeue_entries_handler(&self) -> RequeueEntriesHandler {
        RequeueEntriesHandler::new(self.store.clone())
    }

    pub fn seed_snapshot_handler(&self) -> SeedSnapshotHandler {
        SeedSnapshotHandler::new(self.store.clone(), self.snapshot_provider.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// GET /entries - Page through the log
pub async fn list_entries(
    State(state): State<EventLogAppState>,
    Query(params): Query<ListEntriesParams>,
) -> Result<impl IntoResponse, EventLogApiError> {
    let query = SearchEntriesQuery {
        cursor: params.cursor,
        status: params.status,
        limit: params.limit,
    };

    let page = state.search_entries_handler().handle(query).await?;

    Ok(Json(EntryPageResponse::from(page)))
}

/// POST /entries/requeue - Reset FAILED entries to NEW
pub async fn requeue_entries(
    State(state): State<EventLogAppState>,
    Json(request): Json<RequeueRequest>,
) -> Result<impl IntoResponse, EventLogApiError> {
    let cmd = RequeueEntriesCommand {
        ids: request.ids.into_iter().map(EntryId::new).collect(),
    };

    let result = state.requeue_entries_handler().handle(cmd).await?;

    Ok(Json(RequeueResponse::from(result)))
}

/// POST /snapshots/:event_type - Append a full snapshot for one event type
pub async fn seed_snapshot(
    State(state): State<EventLogAppState>,
    Path(event_type): Path<String>,
) -> Result<impl IntoResponse, EventLogApiError> {
    let cmd = SeedSnapshotCommand { event_type };

    let result = state.seed_snapshot_handler().handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(SnapshotResponse::from(result))))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts event log errors to HTTP responses.
#[derive(Debug)]
pub struct EventLogApiError(EventLogError);

impl From<EventLogError> for EventLogApiError {
    fn from(err: EventLogError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for EventLogApiError {
    fn from(err: DomainError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for EventLogApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            EventLogError::InvalidCursor(_) | EventLogError::ValidationFailed { .. } => {
                StatusCode::BAD_REQUEST
            }
            EventLogError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            EventLogError::InvalidState(_) => StatusCode::CONFLICT,
            EventLogError::Persistence(_) | EventLogError::Infrastructure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let code = self.0.code().to_string();
        let message = self.0.to_string();
        let body = match &self.0 {
            EventLogError::InvalidCursor(value) => {
                ErrorResponse::with_details(code, message, json!({ "cursor": value }))
            }
            EventLogError::ValidationFailed { field, .. } => {
                ErrorResponse::with_details(code, message, json!({ "field": field }))
            }
            _ => ErrorResponse::new(code, message),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: EventLogError) -> StatusCode {
        EventLogApiError::from(err).into_response().status()
    }

    #[test]
    fn errors_map_to_status_codes() {
        assert_eq!(status_of(EventLogError::invalid_cursor("abc")), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(EventLogError::validation("limit", "too big")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(EventLogError::not_implemented("SnapshotProvider")),
            StatusCode::NOT_IMPLEMENTED
        );
        assert_eq!(
            status_of(EventLogError::Persistence("down".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn domain_errors_convert_through_event_log_error() {
        let err = EventLogApiError::from(DomainError::invalid_cursor("-1"));
        assert_eq!(err.0, EventLogError::InvalidCursor("-1".to_string()));
    }
}
