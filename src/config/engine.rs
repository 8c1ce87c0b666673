//! Engine configuration

use std::time::Duration;

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::entitlement::{GracePolicy, DEFAULT_GRACE_PERIOD_DAYS};

/// Reconciliation and collaborator settings
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Treat grace-eligible lapsed subscriptions as still active
    #[serde(default)]
    pub grace_period_enabled: bool,

    /// Length of the grace window in days
    #[serde(default = "default_grace_period_days")]
    pub grace_period_days: i64,

    /// Timeout for verifier, catalog and purchase calls, in seconds
    #[serde(default = "default_collaborator_timeout")]
    pub collaborator_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grace_period_enabled: false,
            grace_period_days: default_grace_period_days(),
            collaborator_timeout_secs: default_collaborator_timeout(),
        }
    }
}

impl EngineConfig {
    pub fn grace_policy(&self) -> GracePolicy {
        let window = chrono::Duration::days(self.grace_period_days);
        if self.grace_period_enabled {
            GracePolicy::enabled(window)
        } else {
            GracePolicy {
                enabled: false,
                window,
            }
        }
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_secs(self.collaborator_timeout_secs)
    }

    /// Validate engine configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=365).contains(&self.grace_period_days) {
            return Err(ValidationError::InvalidGracePeriod(self.grace_period_days));
        }
        if !(1..=300).contains(&self.collaborator_timeout_secs) {
            return Err(ValidationError::InvalidCollaboratorTimeout(
                self.collaborator_timeout_secs,
            ));
        }
        Ok(())
    }
}

fn default_grace_period_days() -> i64 {
    DEFAULT_GRACE_PERIOD_DAYS
}

fn default_collaborator_timeout() -> u64 {
    30
}
