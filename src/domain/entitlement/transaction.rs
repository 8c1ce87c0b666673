//! Transaction records as delivered by the platform and as ingested.
//!
//! A `RawTransaction` is what a feed hands over: business fields plus an
//! optional signature whose authenticity is not yet known. A verifier turns
//! it into a `TransactionEvent` wrapped in `Verification`, which callers must
//! match on before trusting the payload.

use serde::{Deserialize, Serialize};

use super::errors::VerificationError;
use crate::domain::foundation::{ProductId, Timestamp, TransactionId};

/// Unverified transaction record received from a billing feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub transaction_id: TransactionId,
    pub product_id: ProductId,
    pub purchase_date: Timestamp,
    #[serde(default)]
    pub expiration_date: Option<Timestamp>,
    #[serde(default)]
    pub revocation_date: Option<Timestamp>,
    /// Platform signal that a billing retry grace period applies.
    #[serde(default)]
    pub grace_eligible: bool,
    /// Hex-encoded signature over the canonical payload.
    #[serde(default)]
    pub signature: Option<String>,
}

impl RawTransaction {
    /// Creates an unsigned record with only the mandatory fields.
    pub fn new(transaction_id: TransactionId, product_id: ProductId, purchase_date: Timestamp) -> Self {
        Self {
            transaction_id,
            product_id,
            purchase_date,
            expiration_date: None,
            revocation_date: None,
            grace_eligible: false,
            signature: None,
        }
    }

    pub fn with_expiration(mut self, expiration: Timestamp) -> Self {
        self.expiration_date = Some(expiration);
        self
    }

    pub fn with_revocation(mut self, revocation: Timestamp) -> Self {
        self.revocation_date = Some(revocation);
        self
    }

    pub fn with_grace_eligible(mut self, eligible: bool) -> Self {
        self.grace_eligible = eligible;
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Stable textual form of the business fields.
    ///
    /// This is the message a signature covers. Field order and separators
    /// are fixed; absent dates render as empty strings.
    pub fn canonical_payload(&self) -> String {
        fn secs(ts: &Option<Timestamp>) -> String {
            ts.map(|t| t.as_unix_secs().to_string()).unwrap_or_default()
        }

        format!(
            "{}|{}|{}|{}|{}|{}",
            self.transaction_id,
            self.product_id,
            self.purchase_date.as_unix_secs(),
            secs(&self.expiration_date),
            secs(&self.revocation_date),
            self.grace_eligible,
        )
    }
}

/// Authenticity of an ingested event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationState {
    Verified,
    Unverified { reason: String },
}

/// Immutable record of one observed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEvent {
    pub transaction_id: TransactionId,
    pub product_id: ProductId,
    pub purchase_date: Timestamp,
    pub expiration_date: Option<Timestamp>,
    pub revocation_date: Option<Timestamp>,
    pub grace_eligible: bool,
    pub verification: VerificationState,
}

impl TransactionEvent {
    fn from_raw(raw: RawTransaction, verification: VerificationState) -> Self {
        Self {
            transaction_id: raw.transaction_id,
            product_id: raw.product_id,
            purchase_date: raw.purchase_date,
            expiration_date: raw.expiration_date,
            revocation_date: raw.revocation_date,
            grace_eligible: raw.grace_eligible,
            verification,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self.verification, VerificationState::Verified)
    }

    /// Ordering key used to pick the latest transaction of a product.
    ///
    /// Greatest purchase date wins; equal dates fall back to the
    /// lexicographically greatest transaction id.
    pub fn recency_key(&self) -> (Timestamp, &TransactionId) {
        (self.purchase_date, &self.transaction_id)
    }

    /// Returns true if `self` supersedes `other` for the same product.
    pub fn supersedes(&self, other: &TransactionEvent) -> bool {
        self.recency_key() > other.recency_key()
    }
}

/// Outcome of verifying a record; the payload is never implicitly trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification<T> {
    Verified(T),
    Unverified(T, VerificationError),
}

impl Verification<TransactionEvent> {
    /// Marks a raw record as authentic.
    pub fn verified(raw: RawTransaction) -> Self {
        Verification::Verified(TransactionEvent::from_raw(raw, VerificationState::Verified))
    }

    /// Marks a raw record as not authentic, keeping it for audit.
    pub fn unverified(raw: RawTransaction, error: VerificationError) -> Self {
        let state = VerificationState::Unverified {
            reason: error.to_string(),
        };
        Verification::Unverified(TransactionEvent::from_raw(raw, state), error)
    }
}

impl<T> Verification<T> {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verification::Verified(_))
    }

    /// Returns the payload regardless of authenticity.
    pub fn into_payload(self) -> T {
        match self {
            Verification::Verified(payload) | Verification::Unverified(payload, _) => payload,
        }
    }

    /// Returns the payload only when it was verified.
    pub fn into_verified(self) -> Result<T, VerificationError> {
        match self {
            Verification::Verified(payload) => Ok(payload),
            Verification::Unverified(_, error) => Err(error),
        }
    }
}
