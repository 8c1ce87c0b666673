//! Verifier port - authenticity check for incoming transactions.
//!
//! The engine never inspects signatures itself. It hands every raw record to
//! a `Verifier` and trusts only what comes back as `Verification::Verified`.
//!
//! # Example
//!
//! ```ignore
//! match verifier.verify(&raw).await {
//!     Verification::Verified(event) => { /* reconcile */ }
//!     Verification::Unverified(event, reason) => { /* audit only */ }
//! }
//! ```

use async_trait::async_trait;

use crate::domain::entitlement::{RawTransaction, TransactionEvent, Verification};

/// Classifies raw transaction records as verified or unverified.
///
/// Implementations must not fail: problems are reported as
/// `Verification::Unverified` with the reason attached.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, raw: &RawTransaction) -> Verification<TransactionEvent>;
}
