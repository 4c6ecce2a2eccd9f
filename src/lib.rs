//! Event Outbox - Transactional Event Log and Dispatch Engine
//!
//! Events are appended to a durable log alongside the business writes that
//! produce them, then a background dispatch engine claims pending entries and
//! publishes them to a broker, grouped by event type.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
