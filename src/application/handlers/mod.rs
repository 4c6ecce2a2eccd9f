//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod event_log;

pub use event_log::{
    EntryPage, RequeueEntriesCommand, RequeueEntriesHandler, RequeueEntriesResult,
    SearchEntriesHandler, SearchEntriesQuery, SeedSnapshotCommand, SeedSnapshotHandler,
    SeedSnapshotResult,
};
