//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid socket address: {0}")]
    InvalidSocketAddress(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Dispatcher batch size must be between 1 and 1000")]
    InvalidBatchSize,

    #[error("Dispatcher poll interval must be positive")]
    InvalidPollInterval,

    #[error("Dispatcher publish timeout must be positive")]
    InvalidPublishTimeout,

    #[error("Lock lease must be longer than the publish timeout")]
    LeaseTooShort,

    #[error("Backoff initial delay must be positive and not exceed the maximum")]
    InvalidBackoff,

    #[error("Publish concurrency must be between 1 and 64")]
    InvalidConcurrency,

    #[error("Max attempts must be at least 1")]
    InvalidMaxAttempts,

    #[error("Dispatcher instance id must not be blank")]
    InvalidInstanceId,

    #[error("Publisher endpoint must be an http(s) URL")]
    InvalidPublisherEndpoint,

    #[error("Fixed event ids are not allowed in production")]
    FixedEidInProduction,
}
