//! Error taxonomy for the entitlement engine.
//!
//! Duplicate transactions are deliberately absent: a redelivered transaction
//! id is reported through `IngestOutcome::Duplicate`, not as a failure.

use std::time::Duration;

use thiserror::Error;

use crate::domain::foundation::{ProductId, ValidationError};

/// Why a transaction could not be classified as authentic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// The record carried no signature at all.
    #[error("Missing signature")]
    MissingSignature,

    /// Signature did not match the record contents.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signature or payload could not be decoded.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The verification service explicitly refused the record.
    #[error("Rejected: {0}")]
    Rejected(String),

    /// The verification service did not answer in time.
    #[error("Verification timed out")]
    Timeout,
}

/// Errors surfaced by the subscription engine.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Catalog query against the billing platform failed.
    #[error("Catalog load failed: {0}")]
    CatalogLoad(String),

    /// A transaction that had to be authentic was not.
    #[error("Verification failed: {0}")]
    Verification(#[from] VerificationError),

    /// Reconciliation produced an inconsistent result. Indicates a bug.
    #[error("Reconcile invariant violated: {0}")]
    Reconcile(String),

    /// Restore stopped early. Records before the failure stay committed.
    #[error("Restore failed after {committed} records: {reason}")]
    Restore { reason: String, committed: usize },

    /// Another purchase has not finished yet.
    #[error("A purchase is already in progress")]
    PurchaseInProgress,

    /// Product is not part of the loaded catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The platform purchase call failed.
    #[error("Purchase failed: {0}")]
    Purchase(String),

    /// An external collaborator exceeded the configured timeout.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Lifecycle transition refused by the state machine.
    #[error("Invalid engine state: {0}")]
    InvalidState(#[from] ValidationError),
}

impl EngineError {
    /// Returns true if repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::CatalogLoad(_)
                | EngineError::Restore { .. }
                | EngineError::PurchaseInProgress
                | EngineError::Purchase(_)
                | EngineError::Timeout { .. }
                | EngineError::Verification(VerificationError::Timeout)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_error_displays_reason() {
        let err = VerificationError::Rejected("revoked certificate".to_string());
        assert_eq!(format!("{}", err), "Rejected: revoked certificate");
    }

    #[test]
    fn restore_error_reports_committed_count() {
        let err = EngineError::Restore {
            reason: "stream closed".to_string(),
            committed: 3,
        };
        assert_eq!(format!("{}", err), "Restore failed after 3 records: stream closed");
    }

    #[test]
    fn timeout_displays_operation() {
        let err = EngineError::Timeout {
            operation: "catalog fetch",
            after: Duration::from_secs(5),
        };
        assert_eq!(format!("{}", err), "catalog fetch timed out after 5s");
    }

    #[test]
    fn verification_converts_into_engine_error() {
        let err: EngineError = VerificationError::InvalidSignature.into();
        assert!(matches!(err, EngineError::Verification(VerificationError::InvalidSignature)));
    }

    #[test]
    fn transient_failures_are_retryable() {
        assert!(EngineError::CatalogLoad("offline".to_string()).is_retryable());
        assert!(EngineError::PurchaseInProgress.is_retryable());
        assert!(EngineError::Verification(VerificationError::Timeout).is_retryable());
    }

    #[test]
    fn authenticity_and_invariant_failures_are_not_retryable() {
        assert!(!EngineError::Verification(VerificationError::InvalidSignature).is_retryable());
        assert!(!EngineError::Reconcile("two entries".to_string()).is_retryable());
        assert!(!EngineError::ProductNotFound(ProductId::new("p").unwrap()).is_retryable());
    }
}
