//! PostgreSQL adapters - Database implementations for storage ports.
//!
//! - `PostgresLogStore` - The `event_log` outbox table

mod log_store;

pub use log_store::PostgresLogStore;
