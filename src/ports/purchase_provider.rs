//! Purchase provider port - the platform's purchase sheet.
//!
//! The engine does not process payments. It asks the platform to run its own
//! purchase flow and receives either a signed transaction or a reason why
//! there is none yet.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entitlement::{Product, RawTransaction};

/// What the platform purchase flow ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseResult {
    /// Purchase completed; the transaction still needs verification.
    Success(RawTransaction),

    /// Awaiting approval (e.g. parental consent, deferred payment).
    Pending,

    /// The user dismissed the purchase sheet.
    UserCancelled,
}

/// Errors from the purchase flow itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    /// Purchases are disabled on this account or device.
    #[error("Purchase not allowed: {0}")]
    NotAllowed(String),

    /// Platform failed to complete the flow.
    #[error("Purchase failed: {0}")]
    Failed(String),
}

/// Port for starting a platform purchase.
#[async_trait]
pub trait PurchaseProvider: Send + Sync {
    async fn purchase(&self, product: &Product) -> Result<PurchaseResult, PurchaseError>;
}
