//! PublisherClient port - Interface to the external event broker.
//!
//! The broker's wire protocol is not owned here. The dispatch engine only
//! needs to know which entries were accepted and whether a failure is worth
//! retrying.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::event_log::EventLogEntry;
use crate::domain::foundation::Eid;

/// Result of a publish call that reached the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Every event in the batch was accepted.
    Published,
    /// The broker accepted the batch except for the listed events.
    ///
    /// Rejections are matched by eid. Entries that share an eid (nil or fixed
    /// generators) are all treated as rejected when that eid is listed.
    PartiallyPublished { failed: Vec<Eid> },
}

impl PublishOutcome {
    /// True if `eid` was rejected by this outcome.
    pub fn rejected(&self, eid: &Eid) -> bool {
        match self {
            PublishOutcome::Published => false,
            PublishOutcome::PartiallyPublished { failed } => failed.contains(eid),
        }
    }
}

/// A publish call that failed as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    /// Timeouts, connection failures, 5xx responses.
    #[error("Transient publish failure: {0}")]
    Transient(String),

    /// The broker refused the batch; retrying unchanged will not help.
    #[error("Permanent publish failure: {0}")]
    Permanent(String),
}

impl PublishError {
    pub fn transient(message: impl Into<String>) -> Self {
        PublishError::Transient(message.into())
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        PublishError::Permanent(message.into())
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, PublishError::Transient(_))
    }

    pub fn message(&self) -> &str {
        match self {
            PublishError::Transient(m) | PublishError::Permanent(m) => m,
        }
    }
}

/// Port for transmitting a batch of events of one type.
///
/// Implementations receive entries in id order and must not reorder them.
#[async_trait]
pub trait PublisherClient: Send + Sync {
    async fn publish(
        &self,
        event_type: &str,
        events: &[EventLogEntry],
    ) -> Result<PublishOutcome, PublishError>;
}
