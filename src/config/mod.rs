//! Application configuration module
//!
//! Configuration is loaded from environment variables with the `EVENT_OUTBOX`
//! prefix. Nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use event_outbox::config::AppConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! config.validate()?;
//!
//! println!("Server running on {}", config.server.socket_addr()?);
//! # Ok(())
//! # }
//! ```

mod database;
mod dispatcher;
mod eid;
mod error;
mod publisher;
mod server;

pub use database::DatabaseConfig;
pub use dispatcher::DispatcherConfig;
pub use eid::{EidConfig, EidStrategy};
pub use error::{ConfigError, ValidationError};
pub use publisher::PublisherConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Dispatch loop tuning
    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    #[serde(default)]
    pub eid: EidConfig,

    /// Broker endpoint
    #[serde(default)]
    pub publisher: PublisherConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Reads a `.env` file if present, then variables with the `EVENT_OUTBOX`
    /// prefix:
    ///
    /// - `EVENT_OUTBOX__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `EVENT_OUTBOX__DATABASE__URL=...` -> `database.url = ...`
    /// - `EVENT_OUTBOX__DISPATCHER__BATCH_SIZE=50` -> `dispatcher.batch_size = 50`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("EVENT_OUTBOX")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.dispatcher.validate()?;
        self.eid.validate(&self.server.environment)?;
        self.publisher.validate()?;

        if self.dispatcher.enabled && self.publisher.endpoint.is_none() {
            return Err(ValidationError::MissingRequired(
                "EVENT_OUTBOX__PUBLISHER__ENDPOINT",
            ));
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
