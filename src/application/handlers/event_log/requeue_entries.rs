//! RequeueEntriesHandler - Command handler for operator retries.
//!
//! Moves FAILED entries back to NEW with a fresh attempt budget. Entries that
//! are not FAILED are left alone and simply not counted.

use std::sync::Arc;

use tracing::info;

use crate::domain::event_log::{EventLogError, PageLimit};
use crate::domain::foundation::EntryId;
use crate::ports::LogStore;

/// Command to requeue failed entries.
#[derive(Debug, Clone)]
pub struct RequeueEntriesCommand {
    pub ids: Vec<EntryId>,
}

/// Result of a requeue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequeueEntriesResult {
    pub requested: usize,
    pub requeued: u64,
}

/// Handler for requeueing failed entries.
pub struct RequeueEntriesHandler {
    store: Arc<dyn LogStore>,
}

impl RequeueEntriesHandler {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        cmd: RequeueEntriesCommand,
    ) -> Result<RequeueEntriesResult, EventLogError> {
        if cmd.ids.is_empty() {
            return Err(EventLogError::validation("ids", "At least one id is required"));
        }
        if cmd.ids.len() > PageLimit::MAX as usize {
            return Err(EventLogError::validation(
                "ids",
                format!("At most {} ids per request", PageLimit::MAX),
            ));
        }

        let requeued = self.store.requeue(&cmd.ids).await?;
        info!(requested = cmd.ids.len(), requeued, "Requeued failed entries");

        Ok(RequeueEntriesResult {
            requested: cmd.ids.len(),
            requeued,
        })
    }
}
