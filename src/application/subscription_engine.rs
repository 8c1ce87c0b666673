//! SubscriptionEngine - facade over verification, storage and reconciliation.
//!
//! Every write (ingest, restore, catalog load, purchase commit, reset) runs
//! its commit + reconcile + publish step inside one `tokio::sync::Mutex`.
//! Verification and other collaborator calls happen before the lock is taken,
//! so slow verifiers never hold up other writers.
//!
//! Readers never touch the lock: each critical section ends by publishing an
//! immutable `EngineSnapshot` on a `watch` channel.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::{watch, Mutex};
use tokio::time::timeout;

use super::snapshot::EngineSnapshot;
use crate::domain::entitlement::{
    EngineError, EngineState, Entitlement, EntitlementReconciler, GracePolicy, IngestOutcome,
    Product, RawTransaction, TransactionEvent, TransactionStore, Verification, VerificationError,
};
use crate::domain::foundation::{ProductId, StateMachine};
use crate::ports::{
    CatalogSource, Clock, FeedError, PurchaseProvider, PurchaseResult, TransactionFeed, TransactionStream,
    Verifier,
};

/// Default timeout applied to every collaborator call.
pub const DEFAULT_COLLABORATOR_TIMEOUT: Duration = Duration::from_secs(30);

/// External collaborators, injected at construction.
#[derive(Clone)]
pub struct EngineCollaborators {
    pub verifier: Arc<dyn Verifier>,
    pub catalog_source: Arc<dyn CatalogSource>,
    pub feed: Arc<dyn TransactionFeed>,
    pub purchase_provider: Arc<dyn PurchaseProvider>,
    pub clock: Arc<dyn Clock>,
}

/// Tunables for one engine instance.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub grace: GracePolicy,
    pub collaborator_timeout: Duration,
    /// Products requested from the catalog source on `start()`.
    pub product_ids: BTreeSet<ProductId>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            grace: GracePolicy::disabled(),
            collaborator_timeout: DEFAULT_COLLABORATOR_TIMEOUT,
            product_ids: BTreeSet::new(),
        }
    }
}

/// How a purchase call ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// Verified, ingested and reconciled.
    Purchased(TransactionEvent),
    Pending,
    UserCancelled,
}

/// Writer-side state guarded by the reconciliation lock.
#[derive(Default)]
struct EngineCore {
    state: EngineState,
    store: TransactionStore,
    catalog: BTreeMap<ProductId, Product>,
    entitlements: BTreeMap<ProductId, Entitlement>,
    last_error: Option<String>,
}

struct EngineInner {
    collaborators: EngineCollaborators,
    settings: EngineSettings,
    reconciler: EntitlementReconciler,
    core: Mutex<EngineCore>,
    snapshot_tx: watch::Sender<EngineSnapshot>,
    purchasing: AtomicBool,
}

/// Entitlement engine shared by cloning; all clones drive the same state.
#[derive(Clone)]
pub struct SubscriptionEngine {
    inner: Arc<EngineInner>,
}

impl SubscriptionEngine {
    pub fn new(collaborators: EngineCollaborators, settings: EngineSettings) -> Self {
        let (snapshot_tx, _) = watch::channel(EngineSnapshot::default());
        let reconciler = EntitlementReconciler::new(settings.grace);

        Self {
            inner: Arc::new(EngineInner {
                collaborators,
                settings,
                reconciler,
                core: Mutex::new(EngineCore::default()),
                snapshot_tx,
                purchasing: AtomicBool::new(false),
            }),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Queries
    // ════════════════════════════════════════════════════════════════════════════

    /// Latest published snapshot. Never waits on writers.
    pub fn snapshot(&self) -> EngineSnapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Receiver notified after every completed cycle.
    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Returns true if the product is a subscription the user currently has.
    pub fn is_subscribed(&self, product_id: &ProductId) -> bool {
        self.inner.snapshot_tx.borrow().is_subscribed(product_id)
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.inner.settings
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ════════════════════════════════════════════════════════════════════════════

    /// Loads the catalog and replays the platform's current entitlements.
    ///
    /// Neither a catalog failure nor a replay failure aborts startup; both
    /// are recorded in `last_error` and the engine still ends up Ready.
    pub async fn start(&self) -> Result<(), EngineError> {
        {
            let mut core = self.inner.core.lock().await;
            core.state = core.state.transition_to(EngineState::Loading)?;
            self.publish(&core);
        }
        tracing::info!(
            products = self.inner.settings.product_ids.len(),
            "Starting subscription engine"
        );

        match self.fetch_catalog().await {
            Ok(products) => self.load_catalog(products).await,
            Err(e) => {
                tracing::warn!(error = %e, "Catalog load failed; continuing with empty catalog");
                self.record_error(&e).await;
            }
        }

        let current = self.inner.collaborators.feed.current_entitlements();
        if let Err(e) = self.restore(current).await {
            tracing::warn!(error = %e, "Initial entitlement replay incomplete");
        }

        let mut core = self.inner.core.lock().await;
        core.state = core.state.transition_to(EngineState::Ready)?;
        self.publish(&core);
        tracing::info!(
            entitlements = core.entitlements.len(),
            catalog = core.catalog.len(),
            "Subscription engine ready"
        );
        Ok(())
    }

    /// Clears store, entitlements, catalog and last error.
    pub async fn reset(&self) -> Result<(), EngineError> {
        let mut core = self.inner.core.lock().await;
        if core.state != EngineState::Uninitialized {
            core.state = core.state.transition_to(EngineState::Uninitialized)?;
        }
        core.store = TransactionStore::new();
        core.catalog.clear();
        core.entitlements.clear();
        core.last_error = None;
        self.publish(&core);
        tracing::info!("Subscription engine reset");
        Ok(())
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Commands
    // ════════════════════════════════════════════════════════════════════════════

    /// Replaces the catalog.
    pub async fn load_catalog(&self, products: impl IntoIterator<Item = Product>) {
        let mut core = self.inner.core.lock().await;
        core.catalog = products
            .into_iter()
            .map(|product| (product.id.clone(), product))
            .collect();
        self.publish(&core);
        tracing::debug!(products = core.catalog.len(), "Catalog loaded");
    }

    /// Runs one verify, ingest, reconcile, publish cycle.
    ///
    /// Verification failures are recorded on the event and in `last_error`,
    /// never returned. Errors only come from broken internal invariants.
    pub async fn ingest_transaction_feed(
        &self,
        raw: RawTransaction,
    ) -> Result<IngestOutcome, EngineError> {
        let verification = self.verify(&raw).await;

        let mut core = self.inner.core.lock().await;
        let outcome = Self::commit(&mut core, verification);
        if outcome == IngestOutcome::Accepted {
            self.reconcile_and_publish(&mut core)?;
        }
        Ok(outcome)
    }

    /// Replays a finite feed, committing and reconciling in one pass.
    ///
    /// Returns the number of records committed. A feed error stops the replay;
    /// records read before it stay committed and the error reports how many.
    pub async fn restore(&self, mut feed: TransactionStream) -> Result<usize, EngineError> {
        let mut verified = Vec::new();
        let mut failure = None;

        while let Some(item) = feed.next().await {
            match item {
                Ok(raw) => verified.push(self.verify(&raw).await),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        let committed = verified.len();
        let mut core = self.inner.core.lock().await;
        let accepted = verified
            .into_iter()
            .map(|verification| Self::commit(&mut core, verification))
            .filter(|outcome| *outcome == IngestOutcome::Accepted)
            .count();
        self.reconcile_and_publish(&mut core)?;

        match failure {
            None => {
                tracing::info!(committed, accepted, "Restore completed");
                Ok(committed)
            }
            Some(e) => {
                let error = EngineError::Restore {
                    reason: e.to_string(),
                    committed,
                };
                tracing::warn!(committed, accepted, error = %e, "Restore stopped by feed error");
                core.last_error = Some(error.to_string());
                self.publish(&core);
                Err(error)
            }
        }
    }

    /// Restores from the platform's current-entitlements snapshot.
    pub async fn restore_purchases(&self) -> Result<usize, EngineError> {
        let current = self.inner.collaborators.feed.current_entitlements();
        self.restore(current).await
    }

    /// Buys a catalog product through the platform purchase flow.
    ///
    /// Only one purchase may run at a time. A successful purchase must come
    /// back verified; an unverified one is stored for audit and returned as
    /// an error.
    pub async fn purchase(&self, product_id: &ProductId) -> Result<PurchaseOutcome, EngineError> {
        let Some(_guard) = PurchaseGuard::acquire(&self.inner) else {
            let e = EngineError::PurchaseInProgress;
            tracing::debug!(product_id = %product_id, "Purchase rejected; another is running");
            self.record_error(&e).await;
            return Err(e);
        };

        match self.run_purchase(product_id).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::warn!(product_id = %product_id, error = %e, "Purchase failed");
                self.record_error(&e).await;
                Err(e)
            }
        }
    }

    async fn run_purchase(&self, product_id: &ProductId) -> Result<PurchaseOutcome, EngineError> {
        let product = {
            let core = self.inner.core.lock().await;
            core.catalog.get(product_id).cloned()
        }
        .ok_or_else(|| EngineError::ProductNotFound(product_id.clone()))?;

        let after = self.inner.settings.collaborator_timeout;
        let result = timeout(after, self.inner.collaborators.purchase_provider.purchase(&product))
            .await
            .map_err(|_| EngineError::Timeout {
                operation: "purchase",
                after,
            })?
            .map_err(|e| EngineError::Purchase(e.to_string()))?;

        match result {
            PurchaseResult::Success(raw) => {
                let verification = self.verify(&raw).await;
                let mut core = self.inner.core.lock().await;

                match verification {
                    Verification::Verified(event) => {
                        Self::commit(&mut core, Verification::Verified(event.clone()));
                        self.reconcile_and_publish(&mut core)?;
                        tracing::info!(
                            product_id = %product_id,
                            transaction_id = %event.transaction_id,
                            "Purchase completed"
                        );
                        Ok(PurchaseOutcome::Purchased(event))
                    }
                    Verification::Unverified(event, error) => {
                        Self::commit(&mut core, Verification::Unverified(event, error.clone()));
                        self.publish(&core);
                        Err(EngineError::Verification(error))
                    }
                }
            }
            PurchaseResult::Pending => {
                self.record_message("Purchase is pending").await;
                Ok(PurchaseOutcome::Pending)
            }
            PurchaseResult::UserCancelled => {
                self.record_message("Purchase was cancelled").await;
                Ok(PurchaseOutcome::UserCancelled)
            }
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    async fn verify(&self, raw: &RawTransaction) -> Verification<TransactionEvent> {
        let after = self.inner.settings.collaborator_timeout;
        match timeout(after, self.inner.collaborators.verifier.verify(raw)).await {
            Ok(verification) => verification,
            Err(_) => {
                tracing::warn!(
                    transaction_id = %raw.transaction_id,
                    timeout = ?after,
                    "Verifier timed out"
                );
                Verification::unverified(raw.clone(), VerificationError::Timeout)
            }
        }
    }

    async fn fetch_catalog(&self) -> Result<Vec<Product>, EngineError> {
        let after = self.inner.settings.collaborator_timeout;
        let ids = &self.inner.settings.product_ids;
        timeout(after, self.inner.collaborators.catalog_source.fetch_products(ids))
            .await
            .map_err(|_| EngineError::Timeout {
                operation: "catalog fetch",
                after,
            })?
            .map_err(|e| EngineError::CatalogLoad(e.to_string()))
    }

    /// Appends one verified or unverified event to the store.
    fn commit(core: &mut EngineCore, verification: Verification<TransactionEvent>) -> IngestOutcome {
        let (event, failure) = match verification {
            Verification::Verified(event) => (event, None),
            Verification::Unverified(event, error) => (event, Some(error)),
        };
        let transaction_id = event.transaction_id.clone();
        let product_id = event.product_id.clone();

        let outcome = core.store.ingest(event);
        match (outcome, failure) {
            (IngestOutcome::Duplicate, _) => {
                tracing::debug!(transaction_id = %transaction_id, "Duplicate transaction ignored");
            }
            (IngestOutcome::Accepted, None) => {
                tracing::info!(
                    transaction_id = %transaction_id,
                    product_id = %product_id,
                    "Transaction accepted"
                );
            }
            (IngestOutcome::Accepted, Some(error)) => {
                tracing::warn!(
                    transaction_id = %transaction_id,
                    product_id = %product_id,
                    error = %error,
                    "Transaction failed verification; kept for audit"
                );
                core.last_error = Some(format!(
                    "Transaction {} failed verification: {}",
                    transaction_id, error
                ));
            }
        }
        outcome
    }

    fn reconcile_and_publish(&self, core: &mut EngineCore) -> Result<(), EngineError> {
        let now = self.inner.collaborators.clock.now();
        let entitlements = self.inner.reconciler.reconcile(core.store.all(), now);

        if let Err(e) = check_against_index(&core.store, &entitlements) {
            tracing::error!(error = %e, "Reconcile disagrees with the transaction index");
            core.last_error = Some(e.to_string());
            self.publish(core);
            return Err(e);
        }

        core.entitlements = entitlements;
        core.state = core.state.transition_to(EngineState::Ready)?;
        self.publish(core);
        tracing::debug!(entitlements = core.entitlements.len(), "Reconciled");
        Ok(())
    }

    fn publish(&self, core: &EngineCore) {
        let snapshot = EngineSnapshot::build(
            core.state,
            &core.store,
            &core.catalog,
            &core.entitlements,
            core.last_error.clone(),
            false,
        );
        let purchasing = &self.inner.purchasing;
        // Read the flag under the channel's write lock so a concurrent
        // PurchaseGuard update cannot be overwritten with a stale value.
        self.inner.snapshot_tx.send_modify(|current| {
            *current = snapshot;
            current.is_purchasing = purchasing.load(Ordering::SeqCst);
        });
    }

    pub(super) fn feed_updates(&self) -> TransactionStream {
        self.inner.collaborators.feed.updates()
    }

    pub(super) async fn record_feed_error(&self, error: &FeedError) {
        self.record_message(format!("Transaction feed error: {}", error)).await;
    }

    async fn record_error(&self, error: &EngineError) {
        self.record_message(error.to_string()).await;
    }

    async fn record_message(&self, message: impl Into<String>) {
        let mut core = self.inner.core.lock().await;
        core.last_error = Some(message.into());
        self.publish(&core);
    }
}

/// Every entitlement must point at the transaction the store indexes as latest.
fn check_against_index(
    store: &TransactionStore,
    entitlements: &BTreeMap<ProductId, Entitlement>,
) -> Result<(), EngineError> {
    for (product_id, entitlement) in entitlements {
        let indexed = store.by_product(product_id).map(|e| &e.transaction_id);
        if indexed != Some(&entitlement.latest_transaction.transaction_id) {
            return Err(EngineError::Reconcile(format!(
                "entitlement for {} does not match latest indexed transaction",
                product_id
            )));
        }
    }

    let indexed_products: BTreeSet<&ProductId> =
        store.verified().map(|event| &event.product_id).collect();
    if indexed_products.len() != entitlements.len() {
        return Err(EngineError::Reconcile(format!(
            "{} products with verified transactions but {} entitlements",
            indexed_products.len(),
            entitlements.len()
        )));
    }

    Ok(())
}

/// Holds the single in-flight purchase slot; released on drop.
struct PurchaseGuard<'a> {
    inner: &'a EngineInner,
}

impl<'a> PurchaseGuard<'a> {
    fn acquire(inner: &'a EngineInner) -> Option<Self> {
        inner
            .purchasing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        inner.snapshot_tx.send_modify(|s| s.is_purchasing = true);
        Some(Self { inner })
    }
}

impl Drop for PurchaseGuard<'_> {
    fn drop(&mut self) {
        self.inner.purchasing.store(false, Ordering::SeqCst);
        self.inner.snapshot_tx.send_modify(|s| s.is_purchasing = false);
    }
}
