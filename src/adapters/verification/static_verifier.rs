//! Static verifier for development and testing.
//!
//! Decides authenticity from configuration instead of signatures, so tests can
//! drive the engine with plain unsigned records.
//!
//! # Usage
//!
//! ```ignore
//! let verifier = StaticVerifier::accept_all();
//! // Or reject specific transactions:
//! let verifier = StaticVerifier::rejecting(["2000000042"]);
//! ```

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::entitlement::{RawTransaction, TransactionEvent, Verification, VerificationError};
use crate::domain::foundation::TransactionId;
use crate::ports::Verifier;

#[derive(Debug, Clone)]
enum Mode {
    AcceptAll,
    RejectAll,
    RejectIds(HashSet<TransactionId>),
}

/// Verifier with a fixed verdict.
#[derive(Debug, Clone)]
pub struct StaticVerifier {
    mode: Mode,
    /// Simulated latency before answering.
    delay: Option<Duration>,
}

impl Default for StaticVerifier {
    fn default() -> Self {
        Self::accept_all()
    }
}

impl StaticVerifier {
    /// Every record is authentic.
    pub fn accept_all() -> Self {
        Self {
            mode: Mode::AcceptAll,
            delay: None,
        }
    }

    /// No record is authentic.
    pub fn reject_all() -> Self {
        Self {
            mode: Mode::RejectAll,
            delay: None,
        }
    }

    /// Records with the given transaction ids fail verification; all others pass.
    ///
    /// Ids that are not valid transaction ids are ignored.
    pub fn rejecting<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids = ids
            .into_iter()
            .filter_map(|id| TransactionId::new(id).ok())
            .collect();
        Self {
            mode: Mode::RejectIds(ids),
            delay: None,
        }
    }

    /// Answer only after `delay` (for timeout tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn accepts(&self, raw: &RawTransaction) -> bool {
        match &self.mode {
            Mode::AcceptAll => true,
            Mode::RejectAll => false,
            Mode::RejectIds(ids) => !ids.contains(&raw.transaction_id),
        }
    }
}

#[async_trait]
impl Verifier for StaticVerifier {
    async fn verify(&self, raw: &RawTransaction) -> Verification<TransactionEvent> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.accepts(raw) {
            Verification::verified(raw.clone())
        } else {
            Verification::unverified(
                raw.clone(),
                VerificationError::Rejected("rejected by static verifier".to_string()),
            )
        }
    }
}
