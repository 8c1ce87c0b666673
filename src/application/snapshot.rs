//! Immutable view of the engine published to readers.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::entitlement::{
    Entitlement, EngineState, Product, StatusResolver, SubscriptionStatus, TransactionStore,
};
use crate::domain::foundation::ProductId;

/// Everything a consumer may read, as of the last completed cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub state: EngineState,
    pub status: SubscriptionStatus,
    pub entitlements: BTreeMap<ProductId, Entitlement>,
    /// Auto-renewable catalog products, ordered by product id.
    pub subscriptions: Vec<Product>,
    /// Subscriptions whose entitlement currently grants access.
    pub purchased_subscriptions: Vec<Product>,
    pub last_error: Option<String>,
    pub is_purchasing: bool,
    /// Events ingested so far, duplicates excluded.
    pub transaction_count: usize,
}

impl EngineSnapshot {
    pub(crate) fn build(
        state: EngineState,
        store: &TransactionStore,
        catalog: &BTreeMap<ProductId, Product>,
        entitlements: &BTreeMap<ProductId, Entitlement>,
        last_error: Option<String>,
        is_purchasing: bool,
    ) -> Self {
        let subscriptions: Vec<Product> = catalog
            .values()
            .filter(|product| product.is_subscription())
            .cloned()
            .collect();

        let purchased_subscriptions = subscriptions
            .iter()
            .filter(|product| {
                entitlements
                    .get(&product.id)
                    .is_some_and(Entitlement::grants_access)
            })
            .cloned()
            .collect();

        Self {
            state,
            status: StatusResolver::new().resolve(entitlements.values()),
            entitlements: entitlements.clone(),
            subscriptions,
            purchased_subscriptions,
            last_error,
            is_purchasing,
            transaction_count: store.len(),
        }
    }

    /// Returns true if the product is a subscription the user currently has.
    pub fn is_subscribed(&self, product_id: &ProductId) -> bool {
        self.purchased_subscriptions
            .iter()
            .any(|product| &product.id == product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entitlement::{
        EntitlementReconciler, ProductKind, RawTransaction, SubscriptionState, Verification,
    };
    use crate::domain::foundation::{Timestamp, TransactionId};

    fn id(s: &str) -> ProductId {
        ProductId::new(s).unwrap()
    }

    fn catalog() -> BTreeMap<ProductId, Product> {
        let lifetime = Product {
            id: id("p.lifetime"),
            display_name: "Lifetime".to_string(),
            display_price: "$99.99".to_string(),
            kind: ProductKind::Other,
        };
        [
            Product::subscription(id("p.month"), "Monthly", "$4.99"),
            Product::subscription(id("p.year"), "Yearly", "$49.99"),
            lifetime,
        ]
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect()
    }

    fn store_with(records: Vec<RawTransaction>) -> TransactionStore {
        let mut store = TransactionStore::new();
        for raw in records {
            store.ingest(Verification::verified(raw).into_payload());
        }
        store
    }

    fn raw(tx: &str, product: &str, expires: i64) -> RawTransaction {
        RawTransaction::new(
            TransactionId::new(tx).unwrap(),
            id(product),
            Timestamp::from_unix_secs(0).unwrap(),
        )
        .with_expiration(Timestamp::from_unix_secs(expires).unwrap())
    }

    #[test]
    fn default_snapshot_is_not_subscribed() {
        let snapshot = EngineSnapshot::default();
        assert_eq!(snapshot.state, EngineState::Uninitialized);
        assert_eq!(snapshot.status.state, SubscriptionState::NotSubscribed);
        assert!(snapshot.subscriptions.is_empty());
    }

    #[test]
    fn subscriptions_exclude_non_renewable_products() {
        let snapshot = EngineSnapshot::build(
            EngineState::Ready,
            &TransactionStore::new(),
            &catalog(),
            &BTreeMap::new(),
            None,
            false,
        );
        let ids: Vec<_> = snapshot.subscriptions.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p.month", "p.year"]);
        assert!(snapshot.purchased_subscriptions.is_empty());
    }

    #[test]
    fn purchased_subscriptions_only_include_active_entitlements() {
        let now = Timestamp::from_unix_secs(1_000).unwrap();
        let store = store_with(vec![raw("t1", "p.month", 500), raw("t2", "p.year", 5_000)]);
        let entitlements = EntitlementReconciler::default().reconcile(store.all(), now);

        let snapshot = EngineSnapshot::build(
            EngineState::Ready,
            &store,
            &catalog(),
            &entitlements,
            None,
            false,
        );

        assert!(snapshot.is_subscribed(&id("p.year")));
        assert!(!snapshot.is_subscribed(&id("p.month")));
        assert_eq!(snapshot.status.state, SubscriptionState::Subscribed);
        assert_eq!(snapshot.transaction_count, 2);
    }

    #[test]
    fn entitlement_without_catalog_entry_is_not_a_purchased_subscription() {
        let now = Timestamp::from_unix_secs(1_000).unwrap();
        let store = store_with(vec![raw("t1", "p.unknown", 5_000)]);
        let entitlements = EntitlementReconciler::default().reconcile(store.all(), now);

        let snapshot = EngineSnapshot::build(
            EngineState::Ready,
            &store,
            &catalog(),
            &entitlements,
            None,
            false,
        );

        assert!(snapshot.purchased_subscriptions.is_empty());
        assert_eq!(snapshot.status.state, SubscriptionState::Subscribed);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let json = serde_json::to_value(EngineSnapshot::default()).unwrap();
        assert_eq!(json["state"], "uninitialized");
        assert_eq!(json["is_purchasing"], false);
    }
}
