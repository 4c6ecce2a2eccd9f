//! Domain layer containing the event log model.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (ids, timestamps, errors)
//! - `event_log` - Log entries, statuses, pagination and retry policy

pub mod event_log;
pub mod foundation;
