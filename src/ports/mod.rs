//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Outbox Ports
//!
//! - `LogStore` - Transactional event log: append, claim, mark, search
//! - `EidGenerator` - Event identifier source
//!
//! ## Collaborator Ports
//!
//! - `PublisherClient` - Transmits batches of events to the broker
//! - `SnapshotProvider` - Supplies current-state snapshots on demand

mod eid_generator;
mod log_store;
mod publisher_client;
mod snapshot_provider;

pub use eid_generator::EidGenerator;
pub use log_store::{ClaimRequest, FailedDelivery, LogStore};
pub use publisher_client::{PublishError, PublishOutcome, PublisherClient};
pub use snapshot_provider::{SnapshotProvider, SnapshotState, UnconfiguredSnapshotProvider};
