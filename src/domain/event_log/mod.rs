//! Event log - the outbox table's domain model.
//!
//! Entries are appended inside business transactions and then driven through
//! NEW → SENT (or NEW → FAILED → … → SENT) by the dispatch engine.

mod backoff;
mod cursor;
mod entry;
mod errors;
mod status;

pub use backoff::BackoffPolicy;
pub use cursor::{Cursor, PageLimit, SearchQuery};
pub use entry::{EventLogEntry, NewLogEntry};
pub use errors::EventLogError;
pub use status::{EntryStatus, Operation};
