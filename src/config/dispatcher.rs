//! Dispatch engine configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::events::DispatchConfig;
use crate::domain::event_log::BackoffPolicy;
use crate::domain::foundation::LockOwner;

/// Dispatcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DispatcherConfig {
    /// Run the dispatch loop in this process
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Claim owner identity; random per process when unset
    pub instance_id: Option<String>,

    /// Maximum entries claimed per tick
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_publish_timeout_ms")]
    pub publish_timeout_ms: u64,

    /// Claim lease; must outlive a publish call
    #[serde(default = "default_lock_lease_secs")]
    pub lock_lease_secs: u64,

    /// Retry budget for FAILED entries; unlimited when unset
    pub max_attempts: Option<u32>,

    #[serde(default = "default_backoff_initial_ms")]
    pub backoff_initial_ms: u64,

    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,

    /// Event type groups published in parallel
    #[serde(default = "default_publish_concurrency")]
    pub publish_concurrency: usize,
}

impl DispatcherConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }

    pub fn lock_lease(&self) -> Duration {
        Duration::from_secs(self.lock_lease_secs)
    }

    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy::exponential(
            Duration::from_millis(self.backoff_initial_ms),
            Duration::from_millis(self.backoff_max_ms),
        )
    }

    /// Builds the engine configuration.
    pub fn to_dispatch_config(&self) -> Result<DispatchConfig, ValidationError> {
        let owner = match self.instance_id.as_deref() {
            Some(id) => LockOwner::new(id).map_err(|_| ValidationError::InvalidInstanceId)?,
            None => LockOwner::random(),
        };

        Ok(DispatchConfig::default()
            .with_owner(owner)
            .with_poll_interval(self.poll_interval())
            .with_batch_size(self.batch_size)
            .with_publish_timeout(self.publish_timeout())
            .with_lease(self.lock_lease())
            .with_max_attempts(self.max_attempts)
            .with_backoff(self.backoff())
            .with_publish_concurrency(self.publish_concurrency))
    }

    /// Validate dispatcher configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(ValidationError::InvalidBatchSize);
        }
        if self.poll_interval_ms == 0 {
            return Err(ValidationError::InvalidPollInterval);
        }
        if self.publish_timeout_ms == 0 {
            return Err(ValidationError::InvalidPublishTimeout);
        }
        if self.lock_lease().as_millis() <= u128::from(self.publish_timeout_ms) {
            return Err(ValidationError::LeaseTooShort);
        }
        if self.backoff_initial_ms == 0 || self.backoff_initial_ms > self.backoff_max_ms {
            return Err(ValidationError::InvalidBackoff);
        }
        if self.publish_concurrency == 0 || self.publish_concurrency > 64 {
            return Err(ValidationError::InvalidConcurrency);
        }
        if self.max_attempts == Some(0) {
            return Err(ValidationError::InvalidMaxAttempts);
        }
        if self.instance_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err(ValidationError::InvalidInstanceId);
        }
        Ok(())
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            instance_id: None,
            batch_size: default_batch_size(),
            poll_interval_ms: default_poll_interval_ms(),
            publish_timeout_ms: default_publish_timeout_ms(),
            lock_lease_secs: default_lock_lease_secs(),
            max_attempts: None,
            backoff_initial_ms: default_backoff_initial_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            publish_concurrency: default_publish_concurrency(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_batch_size() -> u32 {
    100
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_publish_timeout_ms() -> u64 {
    10_000
}

fn default_lock_lease_secs() -> u64 {
    60
}

fn default_backoff_initial_ms() -> u64 {
    1000
}

fn default_backoff_max_ms() -> u64 {
    300_000
}

fn default_publish_concurrency() -> usize {
    4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DispatcherConfig::default();
        assert!(config.enabled);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_batch_size_bounds() {
        for batch_size in [0, 1001] {
            let config = DispatcherConfig {
                batch_size,
                ..Default::default()
            };
            assert_eq!(config.validate(), Err(ValidationError::InvalidBatchSize));
        }
    }

    #[test]
    fn test_lease_must_outlive_publish_timeout() {
        let config = DispatcherConfig {
            lock_lease_secs: 5,
            publish_timeout_ms: 5_000,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::LeaseTooShort));
    }

    #[test]
    fn test_backoff_bounds() {
        let config = DispatcherConfig {
            backoff_initial_ms: 10_000,
            backoff_max_ms: 1_000,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidBackoff));
    }

    #[test]
    fn test_zero_max_attempts_is_rejected() {
        let config = DispatcherConfig {
            max_attempts: Some(0),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidMaxAttempts));
    }

    #[test]
    fn test_to_dispatch_config_carries_values() {
        let config = DispatcherConfig {
            instance_id: Some("node-7".to_string()),
            batch_size: 25,
            max_attempts: Some(8),
            ..Default::default()
        };

        let dispatch = config.to_dispatch_config().unwrap();

        assert_eq!(dispatch.owner.as_str(), "node-7");
        assert_eq!(dispatch.batch_size, 25);
        assert_eq!(dispatch.max_attempts, Some(8));
        assert_eq!(dispatch.lease, Duration::from_secs(60));
        assert_eq!(dispatch.backoff.delay(1), Duration::from_secs(1));
    }

    #[test]
    fn test_blank_instance_id_is_rejected() {
        let config = DispatcherConfig {
            instance_id: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidInstanceId));
        assert!(config.to_dispatch_config().is_err());
    }
}
