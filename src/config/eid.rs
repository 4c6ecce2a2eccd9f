//! Event identifier generation configuration

use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::error::ValidationError;
use super::server::Environment;
use crate::adapters::eid::{FixedEidGenerator, NoOpEidGenerator, RandomEidGenerator};
use crate::ports::EidGenerator;

/// Which generator stamps eids onto appended entries
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EidStrategy {
    #[default]
    Random,
    /// `fixed_uuid` when set, otherwise the nil UUID
    Fixed,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EidConfig {
    #[serde(default)]
    pub strategy: EidStrategy,

    pub fixed_uuid: Option<Uuid>,
}

impl EidConfig {
    pub fn generator(&self) -> Arc<dyn EidGenerator> {
        match (self.strategy, self.fixed_uuid) {
            (EidStrategy::Random, _) => Arc::new(RandomEidGenerator),
            (EidStrategy::Fixed, Some(uuid)) => Arc::new(FixedEidGenerator::new(uuid)),
            (EidStrategy::Fixed, None) => Arc::new(NoOpEidGenerator),
        }
    }

    /// Fixed eids collide on the unique index, so production refuses them.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.strategy == EidStrategy::Fixed && *environment == Environment::Production {
            return Err(ValidationError::FixedEidInProduction);
        }
        Ok(())
    }
}
