//! Transaction verification configuration

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use crate::adapters::{HmacTransactionVerifier, StaticVerifier};
use crate::ports::Verifier;

/// Verification configuration
#[derive(Debug, Default, Deserialize)]
pub struct VerificationConfig {
    /// Shared secret the feed signs records with.
    ///
    /// When unset, every record is accepted as authentic. Only suitable for
    /// local replays of trusted data.
    pub signing_secret: Option<SecretString>,
}

impl VerificationConfig {
    pub fn is_signed(&self) -> bool {
        self.signing_secret.is_some()
    }

    /// Verifier matching this configuration
    pub fn build_verifier(&self) -> Arc<dyn Verifier> {
        match &self.signing_secret {
            Some(secret) => Arc::new(HmacTransactionVerifier::new(SecretString::new(
                secret.expose_secret().clone(),
            ))),
            None => Arc::new(StaticVerifier::accept_all()),
        }
    }

    /// Validate verification configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(secret) = &self.signing_secret {
            if secret.expose_secret().is_empty() {
                return Err(ValidationError::EmptySigningSecret);
            }
        }
        Ok(())
    }
}
