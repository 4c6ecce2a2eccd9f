//! HTTP adapters - REST API implementations.
//!
//! Each domain module has its own HTTP adapter for endpoint exposure.

pub mod event_log;

// Re-export key types for convenience
pub use event_log::event_log_router;
pub use event_log::EventLogAppState;
