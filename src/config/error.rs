//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Grace period must be between 1 and 365 days, got {0}")]
    InvalidGracePeriod(i64),

    #[error("Collaborator timeout must be between 1 and 300 seconds, got {0}")]
    InvalidCollaboratorTimeout(u64),

    #[error("Product ids must not be empty")]
    EmptyProductId,

    #[error("Product {0} is configured more than once")]
    DuplicateProductId(String),

    #[error("Product {0} has no display name")]
    MissingDisplayName(String),

    #[error("Signing secret must not be empty when set")]
    EmptySigningSecret,

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),
}
