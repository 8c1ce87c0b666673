//! Property-based tests for reconciliation guarantees.
//!
//! For any set of uniquely identified transactions:
//! 1. Order independence: reconcile(shuffle(T)) == reconcile(T)
//! 2. Idempotent ingest: ingesting T twice leaves the store as ingesting it once
//! 3. The store's per-product index agrees with the reconciler
//! 4. Unverified transactions never produce entitlements
//! 5. Status resolution does not depend on iteration order

use proptest::prelude::*;

use entitlement_engine::domain::entitlement::{
    EntitlementReconciler, EntitlementState, GracePolicy, IngestOutcome, RawTransaction,
    StatusResolver, SubscriptionState, TransactionEvent, TransactionStore, Verification,
    VerificationError,
};
use entitlement_engine::domain::foundation::{ProductId, Timestamp, TransactionId};

const NOW: i64 = 1_700_000_000;
const DAY: i64 = 86_400;
const PRODUCTS: [&str; 3] = ["p.month", "p.week", "p.year"];

// =============================================================================
// Strategy helpers
// =============================================================================

#[derive(Debug, Clone)]
struct TxShape {
    product: usize,
    purchase_day: i64,
    expires_in_days: Option<i64>,
    revoked: bool,
    grace_eligible: bool,
    verified: bool,
}

fn shape_strategy() -> impl Strategy<Value = TxShape> {
    (
        0..PRODUCTS.len(),
        -60i64..0,
        prop::option::of(-40i64..40),
        prop::bool::weighted(0.15),
        any::<bool>(),
        prop::bool::weighted(0.8),
    )
        .prop_map(
            |(product, purchase_day, expires_in_days, revoked, grace_eligible, verified)| TxShape {
                product,
                purchase_day,
                expires_in_days,
                revoked,
                grace_eligible,
                verified,
            },
        )
}

/// Events with unique transaction ids; purchase dates may collide.
fn events_strategy(max: usize) -> impl Strategy<Value = Vec<TransactionEvent>> {
    prop::collection::vec(shape_strategy(), 0..=max).prop_map(|shapes| {
        shapes
            .into_iter()
            .enumerate()
            .map(|(index, shape)| build_event(index, shape))
            .collect()
    })
}

fn build_event(index: usize, shape: TxShape) -> TransactionEvent {
    let ts = |secs: i64| Timestamp::from_unix_secs(secs).unwrap();

    let mut raw = RawTransaction::new(
        TransactionId::new(format!("tx-{index:03}")).unwrap(),
        ProductId::new(PRODUCTS[shape.product]).unwrap(),
        ts(NOW + shape.purchase_day * DAY),
    )
    .with_grace_eligible(shape.grace_eligible);

    if let Some(days) = shape.expires_in_days {
        raw = raw.with_expiration(ts(NOW + days * DAY));
    }
    if shape.revoked {
        raw = raw.with_revocation(ts(NOW - DAY));
    }

    let verification = if shape.verified {
        Verification::verified(raw)
    } else {
        Verification::unverified(raw, VerificationError::InvalidSignature)
    };
    verification.into_payload()
}

fn shuffled(max: usize) -> impl Strategy<Value = (Vec<TransactionEvent>, Vec<TransactionEvent>)> {
    events_strategy(max).prop_flat_map(|events| {
        let original = events.clone();
        Just(events)
            .prop_shuffle()
            .prop_map(move |permuted| (original.clone(), permuted))
    })
}

fn reconcilers() -> [EntitlementReconciler; 2] {
    [
        EntitlementReconciler::new(GracePolicy::disabled()),
        EntitlementReconciler::new(GracePolicy::enabled(chrono::Duration::days(16))),
    ]
}

fn now() -> Timestamp {
    Timestamp::from_unix_secs(NOW).unwrap()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn reconcile_is_order_independent((original, permuted) in shuffled(24)) {
        for reconciler in reconcilers() {
            let a = reconciler.reconcile(&original, now());
            let b = reconciler.reconcile(&permuted, now());
            prop_assert_eq!(a, b);
        }
    }

    #[test]
    fn reconcile_is_idempotent(events in events_strategy(24)) {
        let reconciler = EntitlementReconciler::default();
        prop_assert_eq!(
            reconciler.reconcile(&events, now()),
            reconciler.reconcile(&events, now())
        );
    }

    #[test]
    fn ingesting_twice_equals_ingesting_once(events in events_strategy(24)) {
        let mut once = TransactionStore::new();
        for event in events.clone() {
            prop_assert_eq!(once.ingest(event), IngestOutcome::Accepted);
        }

        let mut twice = once.clone();
        for event in events {
            prop_assert_eq!(twice.ingest(event), IngestOutcome::Duplicate);
        }

        prop_assert_eq!(once.all(), twice.all());
        let reconciler = EntitlementReconciler::default();
        prop_assert_eq!(
            reconciler.reconcile(once.all(), now()),
            reconciler.reconcile(twice.all(), now())
        );
    }

    #[test]
    fn store_index_agrees_with_reconciler((original, permuted) in shuffled(24)) {
        let mut store = TransactionStore::new();
        for event in permuted {
            store.ingest(event);
        }

        let entitlements = EntitlementReconciler::default().reconcile(&original, now());
        for product in PRODUCTS {
            let product_id = ProductId::new(product).unwrap();
            let indexed = store.by_product(&product_id).map(|e| e.transaction_id.clone());
            let reconciled = entitlements
                .get(&product_id)
                .map(|e| e.latest_transaction.transaction_id.clone());
            prop_assert_eq!(indexed, reconciled);
        }
    }

    #[test]
    fn unverified_events_never_entitle(events in events_strategy(24)) {
        let unverified: Vec<TransactionEvent> = events
            .into_iter()
            .filter(|e| !e.is_verified())
            .collect();

        let entitlements = EntitlementReconciler::default().reconcile(&unverified, now());
        prop_assert!(entitlements.is_empty());

        let status = StatusResolver::new().resolve(entitlements.values());
        prop_assert_eq!(status.state, SubscriptionState::NotSubscribed);
        prop_assert_eq!(status.expiration_date, None);
    }

    #[test]
    fn revoked_latest_transaction_means_revoked(events in events_strategy(24)) {
        let entitlements = EntitlementReconciler::default().reconcile(&events, now());
        for entitlement in entitlements.values() {
            if entitlement.latest_transaction.revocation_date.is_some() {
                prop_assert_eq!(entitlement.state, EntitlementState::Revoked);
            }
        }
    }

    #[test]
    fn resolution_ignores_iteration_order((original, _) in shuffled(24)) {
        let entitlements = EntitlementReconciler::default().reconcile(&original, now());
        let forward: Vec<_> = entitlements.values().collect();
        let backward: Vec<_> = entitlements.values().rev().collect();

        let resolver = StatusResolver::new();
        prop_assert_eq!(
            resolver.resolve(forward.iter().copied()),
            resolver.resolve(backward.iter().copied())
        );
    }

    #[test]
    fn resolved_status_has_the_furthest_expiration(events in events_strategy(24)) {
        let entitlements = EntitlementReconciler::default().reconcile(&events, now());
        let status = StatusResolver::new().resolve(entitlements.values());

        let furthest = entitlements
            .values()
            .map(|e| e.expiration_date().unwrap_or_else(Timestamp::distant_past))
            .max();
        if let Some(furthest) = furthest {
            prop_assert_eq!(
                status.expiration_date.unwrap_or_else(Timestamp::distant_past),
                furthest
            );
        }
    }
}
