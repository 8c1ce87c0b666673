//! State machine trait for lifecycle enums.
//!
//! Lifecycle enums declare their legal edges once; callers go through
//! `transition_to`, which refuses anything not declared.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for EngineState {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         matches!((self, target), (Uninitialized, Loading) | (Loading, Ready))
///     }
///
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Uninitialized => vec![Loading],
///             Loading => vec![Ready],
///             Ready => vec![],
///         }
///     }
/// }
///
/// let next = state.transition_to(EngineState::Ready)?;
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
