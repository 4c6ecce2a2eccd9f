//! SeedSnapshotHandler - Command handler that appends a full snapshot.
//!
//! Pages through the SnapshotProvider and appends every state as a SNAPSHOT
//! entry, so consumers that replay the log from that point see current state
//! for every key.

use std::sync::Arc;

use tracing::info;

use crate::domain::event_log::{EventLogError, NewLogEntry, Operation};
use crate::domain::foundation::EntryId;
use crate::ports::{LogStore, SnapshotProvider};

/// Command to snapshot one event type.
#[derive(Debug, Clone)]
pub struct SeedSnapshotCommand {
    pub event_type: String,
}

/// Result of a snapshot run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSnapshotResult {
    pub event_type: String,
    pub appended: usize,
    pub first_entry_id: Option<EntryId>,
    pub last_entry_id: Option<EntryId>,
}

/// Handler for seeding snapshots.
pub struct SeedSnapshotHandler {
    store: Arc<dyn LogStore>,
    provider: Arc<dyn SnapshotProvider>,
}

impl SeedSnapshotHandler {
    pub fn new(store: Arc<dyn LogStore>, provider: Arc<dyn SnapshotProvider>) -> Self {
        Self { store, provider }
    }

    pub async fn handle(
        &self,
        cmd: SeedSnapshotCommand,
    ) -> Result<SeedSnapshotResult, EventLogError> {
        if cmd.event_type.trim().is_empty() {
            return Err(EventLogError::validation("event_type", "Event type is required"));
        }

        let mut result = SeedSnapshotResult {
            event_type: cmd.event_type.clone(),
            appended: 0,
            first_entry_id: None,
            last_entry_id: None,
        };
        let mut after: Option<String> = None;

        loop {
            let page = self
                .provider
                .produce_snapshot(&cmd.event_type, after.as_deref())
                .await?;

            let Some(last) = page.last() else {
                break;
            };
            if after.as_deref() == Some(last.key.as_str()) {
                return Err(EventLogError::InvalidState(format!(
                    "Snapshot provider did not advance past key '{}'",
                    last.key
                )));
            }
            after = Some(last.key.clone());

            for state in page {
                let entry = NewLogEntry::new(&cmd.event_type, Operation::Snapshot, state.payload)?;
                let appended = self.store.append(entry).await?;
                result.first_entry_id.get_or_insert(appended.id);
                result.last_entry_id = Some(appended.id);
                result.appended += 1;
            }
        }

        info!(
            event_type = %cmd.event_type,
            appended = result.appended,
            "Snapshot seeded"
        );

        Ok(result)
    }
}
