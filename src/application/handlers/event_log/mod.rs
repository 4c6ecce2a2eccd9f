//! Event log command and query handlers.

mod requeue_entries;
mod search_entries;
mod seed_snapshot;

pub use requeue_entries::{RequeueEntriesCommand, RequeueEntriesHandler, RequeueEntriesResult};
pub use search_entries::{EntryPage, SearchEntriesHandler, SearchEntriesQuery};
pub use seed_snapshot::{SeedSnapshotCommand, SeedSnapshotHandler, SeedSnapshotResult};
