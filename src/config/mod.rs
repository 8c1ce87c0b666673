//! Application configuration module
//!
//! This module provides type-safe configuration loading from an optional
//! config file and environment variables using the `config` and `dotenvy`
//! crates. Environment variables use the `ENTITLEMENT_ENGINE` prefix and
//! nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use entitlement_engine::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Grace period enabled: {}", config.engine.grace_period_enabled);
//! ```

mod catalog;
mod engine;
mod error;
mod telemetry;
mod verification;

pub use catalog::{CatalogConfig, ProductConfig};
pub use engine::EngineConfig;
pub use error::{ConfigError, ValidationError};
pub use telemetry::TelemetryConfig;
pub use verification::VerificationConfig;

use std::path::Path;

use serde::Deserialize;

use crate::application::EngineSettings;

const ENV_PREFIX: &str = "ENTITLEMENT_ENGINE";

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a usable
/// (if catalog-less) configuration.
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Reconciliation and timeout settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Product catalog metadata
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Transaction signature verification
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Logging
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `ENTITLEMENT_ENGINE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `ENTITLEMENT_ENGINE__ENGINE__GRACE_PERIOD_ENABLED=true` -> `engine.grace_period_enabled = true`
    /// - `ENTITLEMENT_ENGINE__VERIFICATION__SIGNING_SECRET=...` -> `verification.signing_secret = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_file(None)
    }

    /// Load configuration from a file, with environment variables on top
    ///
    /// The format follows the file extension (TOML, JSON, YAML, ...).
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with_file(Some(path.as_ref()))
    }

    fn load_with_file(path: Option<&Path>) -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.engine.validate()?;
        self.catalog.validate()?;
        self.verification.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }

    /// Engine settings derived from the engine and catalog sections
    pub fn engine_settings(&self) -> Result<EngineSettings, ValidationError> {
        Ok(EngineSettings {
            grace: self.engine.grace_policy(),
            collaborator_timeout: self.engine.collaborator_timeout(),
            product_ids: self.catalog.product_ids()?,
        })
    }
}
