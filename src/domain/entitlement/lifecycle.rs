//! Engine lifecycle state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Lifecycle of the subscription engine.
///
/// Once `Ready`, the engine only leaves it through an explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// Constructed or reset; nothing loaded.
    #[default]
    Uninitialized,

    /// Catalog and initial entitlement feed in flight.
    Loading,

    /// At least one reconcile cycle has completed.
    Ready,
}

impl StateMachine for EngineState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use EngineState::*;
        matches!(
            (self, target),
            (Uninitialized, Loading)
                // Ingest before start() reconciles straight away
                | (Uninitialized, Ready)
                | (Loading, Ready)
                | (Loading, Uninitialized)
                | (Ready, Ready)
                | (Ready, Uninitialized)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use EngineState::*;
        match self {
            Uninitialized => vec![Loading, Ready],
            Loading => vec![Ready, Uninitialized],
            Ready => vec![Ready, Uninitialized],
        }
    }
}
