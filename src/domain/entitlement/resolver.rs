//! Picks the single status shown to consumers.
//!
//! Several subscriptions may be entitled at once (monthly and yearly, say).
//! The entitlement with the furthest expiration date speaks for all of them;
//! equal expirations fall back to the smallest product id so the choice never
//! depends on iteration order.

use std::cmp::Ordering;

use super::entitlement_record::Entitlement;
use super::status::SubscriptionStatus;
use crate::domain::foundation::Timestamp;

/// Stateless resolver from entitlements to one subscription status.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusResolver;

impl StatusResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolves the status of a set of entitlements.
    pub fn resolve<'a, I>(&self, entitlements: I) -> SubscriptionStatus
    where
        I: IntoIterator<Item = &'a Entitlement>,
    {
        entitlements
            .into_iter()
            .max_by(|a, b| Self::precedence(a, b))
            .map(|selected| SubscriptionStatus {
                state: selected.state.into(),
                expiration_date: selected.expiration_date(),
            })
            .unwrap_or_else(SubscriptionStatus::not_subscribed)
    }

    /// Greater means "more representative".
    fn precedence(a: &Entitlement, b: &Entitlement) -> Ordering {
        let expiry = |e: &Entitlement| e.expiration_date().unwrap_or_else(Timestamp::distant_past);
        expiry(a)
            .cmp(&expiry(b))
            // Reversed so the smaller product id ranks higher on ties.
            .then_with(|| b.product_id.cmp(&a.product_id))
    }
}
