//! Folds transactions into the canonical entitlement set.
//!
//! Reconciliation is a pure function of its inputs: the same transactions
//! and the same `now` always produce the same mapping, whatever order the
//! transactions arrive in.

use std::collections::BTreeMap;

use chrono::Duration;

use super::entitlement_record::{Entitlement, EntitlementState};
use super::transaction::TransactionEvent;
use crate::domain::foundation::{ProductId, Timestamp};

/// Default billing-retry grace window.
pub const DEFAULT_GRACE_PERIOD_DAYS: i64 = 16;

/// Policy for treating recently expired subscriptions as still active.
///
/// Grace only applies when the policy is enabled AND the platform flagged the
/// transaction as grace eligible. The window itself is never inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GracePolicy {
    pub enabled: bool,
    pub window: Duration,
}

impl GracePolicy {
    /// Grace detection switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            window: Duration::days(DEFAULT_GRACE_PERIOD_DAYS),
        }
    }

    /// Grace detection with the given window.
    pub fn enabled(window: Duration) -> Self {
        Self {
            enabled: true,
            window,
        }
    }

    fn covers(&self, event: &TransactionEvent, expiration: Timestamp, now: Timestamp) -> bool {
        self.enabled && event.grace_eligible && now <= expiration.plus(self.window)
    }
}

impl Default for GracePolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Pure reconciler from transactions to entitlements.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntitlementReconciler {
    grace: GracePolicy,
}

impl EntitlementReconciler {
    pub fn new(grace: GracePolicy) -> Self {
        Self { grace }
    }

    pub fn grace_policy(&self) -> GracePolicy {
        self.grace
    }

    /// Builds one entitlement per product from the verified transactions.
    ///
    /// Unverified events in the input are skipped.
    pub fn reconcile<'a, I>(&self, transactions: I, now: Timestamp) -> BTreeMap<ProductId, Entitlement>
    where
        I: IntoIterator<Item = &'a TransactionEvent>,
    {
        let mut latest: BTreeMap<&ProductId, &TransactionEvent> = BTreeMap::new();

        for event in transactions.into_iter().filter(|e| e.is_verified()) {
            latest
                .entry(&event.product_id)
                .and_modify(|current| {
                    if event.supersedes(*current) {
                        *current = event;
                    }
                })
                .or_insert(event);
        }

        latest
            .into_iter()
            .map(|(product_id, event)| {
                let entitlement = Entitlement {
                    product_id: product_id.clone(),
                    latest_transaction: event.clone(),
                    state: self.derive_state(event, now),
                };
                (product_id.clone(), entitlement)
            })
            .collect()
    }

    /// Entitlement state implied by a single transaction at `now`.
    ///
    /// Revocation dominates everything. An expiration exactly at `now` still
    /// counts as subscribed.
    pub fn derive_state(&self, event: &TransactionEvent, now: Timestamp) -> EntitlementState {
        if event.revocation_date.is_some() {
            return EntitlementState::Revoked;
        }

        match event.expiration_date {
            Some(expiration) if expiration < now => {
                if self.grace.covers(event, expiration, now) {
                    EntitlementState::InGracePeriod
                } else {
                    EntitlementState::Expired
                }
            }
            _ => EntitlementState::Subscribed,
        }
    }
}
