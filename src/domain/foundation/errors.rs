//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: i64, max: i64, actual: i64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    InvalidCursor,

    // Not found errors
    EntryNotFound,

    // State errors
    InvalidStateTransition,

    // Delivery errors
    PublishFailed,

    // Wiring errors
    NotImplemented,

    // Infrastructure errors
    PersistenceError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::InvalidCursor => "INVALID_CURSOR",
            ErrorCode::EntryNotFound => "ENTRY_NOT_FOUND",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::PublishFailed => "PUBLISH_FAILED",
            ErrorCode::NotImplemented => "NOT_IMPLEMENTED",
            ErrorCode::PersistenceError => "PERSISTENCE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a validation error for a specific field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ValidationFailed,
            message: message.into(),
            details: HashMap::new(),
        }
        .with_detail("field", field.into())
    }

    /// Creates a persistence error wrapping a store failure.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PersistenceError, message)
    }

    /// Creates an invalid cursor error carrying the offending value.
    pub fn invalid_cursor(value: impl Into<String>) -> Self {
        let value = value.into();
        Self::new(
            ErrorCode::InvalidCursor,
            format!("Invalid cursor '{}': expected a non-negative integer", value),
        )
        .with_detail("cursor", value)
    }

    /// Creates an error for a collaborator that was never supplied.
    pub fn not_implemented(capability: impl Into<String>) -> Self {
        let capability = capability.into();
        Self::new(
            ErrorCode::NotImplemented,
            format!("{} is not implemented; supply an implementation", capability),
        )
        .with_detail("capability", capability)
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        let field = match &err {
            ValidationError::EmptyField { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidFormat { field, .. } => field.clone(),
        };
        DomainError::validation(field, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("event_type");
        assert_eq!(format!("{}", err), "Field 'event_type' cannot be empty");
    }

    #[test]
    fn validation_error_out_of_range_displays_correctly() {
        let err = ValidationError::out_of_range("limit", 1, 1000, 0);
        assert_eq!(
            format!("{}", err),
            "Field 'limit' must be between 1 and 1000, got 0"
        );
    }

    #[test]
    fn domain_error_displays_code_and_message() {
        let err = DomainError::persistence("connection reset");
        assert_eq!(format!("{}", err), "[PERSISTENCE_ERROR] connection reset");
    }

    #[test]
    fn invalid_cursor_embeds_value() {
        let err = DomainError::invalid_cursor("abc");
        assert_eq!(err.code, ErrorCode::InvalidCursor);
        assert!(err.message.contains("'abc'"));
        assert_eq!(err.details.get("cursor"), Some(&"abc".to_string()));
    }

    #[test]
    fn not_implemented_names_capability() {
        let err = DomainError::not_implemented("SnapshotProvider::produce_snapshot");
        assert_eq!(err.code, ErrorCode::NotImplemented);
        assert!(err.message.contains("SnapshotProvider::produce_snapshot"));
    }

    #[test]
    fn validation_error_converts_with_field_detail() {
        let err: DomainError = ValidationError::empty_field("event_type").into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.details.get("field"), Some(&"event_type".to_string()));
    }

    #[test]
    fn error_code_display_formats_correctly() {
        assert_eq!(format!("{}", ErrorCode::InvalidCursor), "INVALID_CURSOR");
        assert_eq!(format!("{}", ErrorCode::NotImplemented), "NOT_IMPLEMENTED");
    }
}
