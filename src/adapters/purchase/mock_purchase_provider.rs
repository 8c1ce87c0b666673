//! Mock purchase provider for testing.
//!
//! Supports:
//! - Queued results, returned in order
//! - Error injection
//! - Call tracking
//! - Simulated latency, to observe the in-flight purchase guard

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::entitlement::Product;
use crate::domain::foundation::ProductId;
use crate::ports::{PurchaseError, PurchaseProvider, PurchaseResult};

/// Mock purchase provider.
///
/// With nothing queued, purchases end as `UserCancelled`.
#[derive(Clone, Default)]
pub struct MockPurchaseProvider {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    results: VecDeque<Result<PurchaseResult, PurchaseError>>,
    call_log: Vec<ProductId>,
    delay: Option<Duration>,
}

impl MockPurchaseProvider {
    pub fn new() -> Self {
        Self::default()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Queue the outcome of a future purchase.
    pub fn enqueue(&self, result: PurchaseResult) {
        self.state().results.push_back(Ok(result));
    }

    /// Queue a failure for a future purchase.
    pub fn enqueue_error(&self, error: PurchaseError) {
        self.state().results.push_back(Err(error));
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state().delay = Some(delay);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    /// Products purchased so far, in call order.
    pub fn calls(&self) -> Vec<ProductId> {
        self.state().call_log.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state().call_log.len()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl PurchaseProvider for MockPurchaseProvider {
    async fn purchase(&self, product: &Product) -> Result<PurchaseResult, PurchaseError> {
        let (delay, result) = {
            let mut state = self.state();
            state.call_log.push(product.id.clone());
            (state.delay, state.results.pop_front())
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        result.unwrap_or(Ok(PurchaseResult::UserCancelled))
    }
}
