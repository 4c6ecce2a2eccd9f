//! EidGenerator implementations.

use uuid::Uuid;

use crate::domain::foundation::Eid;
use crate::ports::EidGenerator;

/// Random v4 UUIDs. The production default.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomEidGenerator;

impl EidGenerator for RandomEidGenerator {
    fn generate(&self) -> Eid {
        Eid::from_uuid(Uuid::new_v4())
    }
}

/// Always the nil UUID.
///
/// For tests that do not care about eids. Stores that enforce eid uniqueness
/// accept only one entry from this generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEidGenerator;

impl EidGenerator for NoOpEidGenerator {
    fn generate(&self) -> Eid {
        Eid::nil()
    }
}

/// Always the configured UUID. Used for deterministic fixtures.
#[derive(Debug, Clone, Copy)]
pub struct FixedEidGenerator {
    eid: Eid,
}

impl FixedEidGenerator {
    pub fn new(uuid: Uuid) -> Self {
        Self {
            eid: Eid::from_uuid(uuid),
        }
    }
}

impl EidGenerator for FixedEidGenerator {
    fn generate(&self) -> Eid {
        self.eid
    }
}
