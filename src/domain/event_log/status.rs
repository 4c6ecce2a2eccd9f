//! EntryStatus and Operation enums for log entries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// Delivery status of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    /// Appended, never attempted or requeued by an operator.
    #[default]
    New,
    /// Acknowledged by the broker. Terminal.
    Sent,
    /// Last publish attempt failed; retried once its backoff window passes.
    Failed,
}

impl EntryStatus {
    /// Persisted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::New => "NEW",
            EntryStatus::Sent => "SENT",
            EntryStatus::Failed => "FAILED",
        }
    }
}

impl StateMachine for EntryStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use EntryStatus::*;
        matches!(
            (self, target),
            (New, Sent) | (New, Failed) | (Failed, Sent) | (Failed, Failed) | (Failed, New)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use EntryStatus::*;
        match self {
            New => vec![Sent, Failed],
            Failed => vec![Sent, Failed, New],
            Sent => vec![],
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEW" => Ok(EntryStatus::New),
            "SENT" => Ok(EntryStatus::Sent),
            "FAILED" => Ok(EntryStatus::Failed),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

/// What triggered the event. A semantic tag, not a transport concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Create,
    Update,
    Delete,
    Snapshot,
}

impl Operation {
    /// Single-character code used in the `operation` column.
    pub fn code(&self) -> &'static str {
        match self {
            Operation::Create => "C",
            Operation::Update => "U",
            Operation::Delete => "D",
            Operation::Snapshot => "S",
        }
    }

    /// Parses the single-character column code.
    pub fn from_code(code: &str) -> Result<Self, ValidationError> {
        match code.trim() {
            "C" => Ok(Operation::Create),
            "U" => Ok(Operation::Update),
            "D" => Ok(Operation::Delete),
            "S" => Ok(Operation::Snapshot),
            other => Err(ValidationError::invalid_format(
                "operation",
                format!("unknown operation code '{}'", other),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "CREATE",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
            Operation::Snapshot => "SNAPSHOT",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_is_new() {
        assert_eq!(EntryStatus::default(), EntryStatus::New);
    }

    #[test]
    fn sent_is_terminal() {
        assert!(EntryStatus::Sent.is_terminal());
        assert!(EntryStatus::Sent.transition_to(EntryStatus::Failed).is_err());
        assert!(EntryStatus::Sent.transition_to(EntryStatus::New).is_err());
    }

    #[test]
    fn failed_can_be_retried_or_requeued() {
        assert!(EntryStatus::Failed.can_transition_to(&EntryStatus::Sent));
        assert!(EntryStatus::Failed.can_transition_to(&EntryStatus::Failed));
        assert!(EntryStatus::Failed.can_transition_to(&EntryStatus::New));
    }

    #[test]
    fn new_cannot_be_requeued() {
        assert!(!EntryStatus::New.can_transition_to(&EntryStatus::New));
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("failed".parse::<EntryStatus>().unwrap(), EntryStatus::Failed);
        assert_eq!(" SENT ".parse::<EntryStatus>().unwrap(), EntryStatus::Sent);
        assert!("CLAIMED".parse::<EntryStatus>().is_err());
    }

    #[test]
    fn status_serializes_uppercase() {
        let json = serde_json::to_string(&EntryStatus::Failed).unwrap();
        assert_eq!(json, "\"FAILED\"");
    }

    #[test]
    fn operation_codes_roundtrip() {
        for op in [
            Operation::Create,
            Operation::Update,
            Operation::Delete,
            Operation::Snapshot,
        ] {
            assert_eq!(Operation::from_code(op.code()).unwrap(), op);
        }
        assert!(Operation::from_code("X").is_err());
    }
}
