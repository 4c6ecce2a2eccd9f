//! Event delivery adapters.
//!
//! - `DispatchEngine` - Background service that drains the event log
//! - `HttpPublisherClient` - Publishes batches to a broker over HTTP
//! - `RecordingPublisher` - In-process publisher for testing

mod dispatch_engine;
mod http_publisher;
mod recording_publisher;

pub use dispatch_engine::{DispatchConfig, DispatchEngine, TickOutcome, TickReport};
pub use http_publisher::{HttpPublisherClient, HttpPublisherConfig};
pub use recording_publisher::{PublishedBatch, RecordingPublisher};
