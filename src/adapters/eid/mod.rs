//! Event identifier generators.
//!
//! - `RandomEidGenerator` - UUID v4, used in production
//! - `NoOpEidGenerator` - nil UUID, for tests
//! - `FixedEidGenerator` - a configured UUID, for deterministic fixtures

mod generators;

pub use generators::{FixedEidGenerator, NoOpEidGenerator, RandomEidGenerator};
