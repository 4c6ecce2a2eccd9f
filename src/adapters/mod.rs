//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `eid` - Event identifier generators
//! - `events` - Dispatch engine and publisher clients
//! - `http` - REST endpoints over the event log
//! - `memory` - In-memory log store
//! - `postgres` - PostgreSQL log store

pub mod eid;
pub mod events;
pub mod http;
pub mod memory;
pub mod postgres;

pub use eid::{FixedEidGenerator, NoOpEidGenerator, RandomEidGenerator};
pub use events::{
    DispatchConfig, DispatchEngine, HttpPublisherClient, HttpPublisherConfig, RecordingPublisher,
    TickOutcome, TickReport,
};
pub use memory::InMemoryLogStore;
pub use postgres::PostgresLogStore;
