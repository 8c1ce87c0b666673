//! Reconciled right to a product's benefits.

use serde::{Deserialize, Serialize};

use super::transaction::TransactionEvent;
use crate::domain::foundation::{ProductId, Timestamp};

/// Derived state of a single product's entitlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementState {
    /// Paid up and not expired.
    Subscribed,

    /// Past its expiration date without renewal.
    Expired,

    /// Expired, but the platform is still retrying billing.
    /// Access is retained provisionally.
    InGracePeriod,

    /// Refunded or otherwise revoked by the platform.
    Revoked,
}

impl EntitlementState {
    /// Returns true if this state grants access to the product.
    pub fn grants_access(&self) -> bool {
        matches!(self, EntitlementState::Subscribed | EntitlementState::InGracePeriod)
    }
}

/// One product's entitlement, derived from its latest verified transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    pub product_id: ProductId,
    pub latest_transaction: TransactionEvent,
    pub state: EntitlementState,
}

impl Entitlement {
    pub fn expiration_date(&self) -> Option<Timestamp> {
        self.latest_transaction.expiration_date
    }

    pub fn grants_access(&self) -> bool {
        self.state.grants_access()
    }
}
