//! State machine trait for status enums.
//!
//! Gives lifecycle statuses a single way to validate transitions, so stores
//! and entities reject illegal moves (e.g. anything leaving SENT) uniformly.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// Implementors list their legal edges; validated transitions come for free.
///
/// # Example
///
/// ```ignore
/// let next = EntryStatus::New.transition_to(EntryStatus::Sent)?;
/// assert!(next.is_terminal());
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
