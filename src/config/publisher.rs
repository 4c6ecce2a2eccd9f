//! Broker publisher configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::events::HttpPublisherConfig;

/// HTTP broker endpoint used by the dispatcher
#[derive(Debug, Clone, Deserialize)]
pub struct PublisherConfig {
    /// Base URL of the broker ingestion API
    pub endpoint: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl PublisherConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Client configuration, if an endpoint is set.
    pub fn http_config(&self) -> Option<HttpPublisherConfig> {
        self.endpoint
            .as_ref()
            .map(|endpoint| HttpPublisherConfig::new(endpoint).with_timeout(self.request_timeout()))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(ValidationError::InvalidPublisherEndpoint);
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    10
}
