//! EidGenerator port - Source of event identifiers.

use crate::domain::foundation::Eid;

/// Produces the deduplication id stamped on every appended entry.
///
/// Stores call this exactly once per append, before the row is written.
pub trait EidGenerator: Send + Sync {
    fn generate(&self) -> Eid;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn EidGenerator) {}
}
