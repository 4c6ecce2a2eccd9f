//! Event-log specific error types.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

/// Errors surfaced to callers of the event log.
///
/// Delivery failures never appear here: they are absorbed into entry state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventLogError {
    #[error("Invalid cursor '{0}': expected a non-negative integer")]
    InvalidCursor(String),

    #[error("Validation failed for '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    #[error("{0} is not implemented; supply an implementation")]
    NotImplemented(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Error: {0}")]
    Infrastructure(String),
}

impl EventLogError {
    pub fn invalid_cursor(value: impl Into<String>) -> Self {
        EventLogError::InvalidCursor(value.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EventLogError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_implemented(capability: impl Into<String>) -> Self {
        EventLogError::NotImplemented(capability.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            EventLogError::InvalidCursor(_) => ErrorCode::InvalidCursor,
            EventLogError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            EventLogError::NotImplemented(_) => ErrorCode::NotImplemented,
            EventLogError::InvalidState(_) => ErrorCode::InvalidStateTransition,
            EventLogError::Persistence(_) => ErrorCode::PersistenceError,
            EventLogError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }
}

impl From<DomainError> for EventLogError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::InvalidCursor => EventLogError::InvalidCursor(
                err.details.get("cursor").cloned().unwrap_or(err.message),
            ),
            ErrorCode::ValidationFailed => EventLogError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            ErrorCode::NotImplemented => EventLogError::NotImplemented(
                err.details.get("capability").cloned().unwrap_or(err.message),
            ),
            ErrorCode::InvalidStateTransition => EventLogError::InvalidState(err.message),
            ErrorCode::PersistenceError => EventLogError::Persistence(err.message),
            _ => EventLogError::Infrastructure(err.to_string()),
        }
    }
}

impl From<ValidationError> for EventLogError {
    fn from(err: ValidationError) -> Self {
        DomainError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_cursor_message_contains_value() {
        let err = EventLogError::invalid_cursor("abc");
        assert!(err.to_string().contains("abc"));
        assert_eq!(err.code(), ErrorCode::InvalidCursor);
    }

    #[test]
    fn domain_invalid_cursor_keeps_raw_value() {
        let err: EventLogError = DomainError::invalid_cursor("-3").into();
        assert_eq!(err, EventLogError::InvalidCursor("-3".to_string()));
    }

    #[test]
    fn domain_not_implemented_keeps_capability() {
        let err: EventLogError = DomainError::not_implemented("SnapshotProvider").into();
        assert_eq!(err, EventLogError::NotImplemented("SnapshotProvider".to_string()));
    }

    #[test]
    fn domain_persistence_maps_to_persistence() {
        let err: EventLogError = DomainError::persistence("disk full").into();
        assert_eq!(err, EventLogError::Persistence("disk full".to_string()));
    }

    #[test]
    fn validation_error_keeps_field() {
        let err: EventLogError = ValidationError::empty_field("event_type").into();
        match err {
            EventLogError::ValidationFailed { field, .. } => assert_eq!(field, "event_type"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
