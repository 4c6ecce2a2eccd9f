//! In-memory adapters for tests and local runs.

mod log_store;

pub use log_store::InMemoryLogStore;
