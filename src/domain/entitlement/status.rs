//! Single subscription status shown to consumers.

use serde::{Deserialize, Serialize};

use super::entitlement_record::EntitlementState;
use crate::domain::foundation::Timestamp;

/// Overall subscription state across all products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    Subscribed,
    Expired,
    InGracePeriod,
    Revoked,
    NotSubscribed,
}

impl From<EntitlementState> for SubscriptionState {
    fn from(state: EntitlementState) -> Self {
        match state {
            EntitlementState::Subscribed => SubscriptionState::Subscribed,
            EntitlementState::Expired => SubscriptionState::Expired,
            EntitlementState::InGracePeriod => SubscriptionState::InGracePeriod,
            EntitlementState::Revoked => SubscriptionState::Revoked,
        }
    }
}

/// Resolved status plus the expiration of the entitlement it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    pub state: SubscriptionState,
    pub expiration_date: Option<Timestamp>,
}

impl SubscriptionStatus {
    pub fn not_subscribed() -> Self {
        Self {
            state: SubscriptionState::NotSubscribed,
            expiration_date: None,
        }
    }

    /// Returns true if the status grants access.
    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            SubscriptionState::Subscribed | SubscriptionState::InGracePeriod
        )
    }
}

impl Default for SubscriptionStatus {
    fn default() -> Self {
        Self::not_subscribed()
    }
}
