//! In-process transaction feed.
//!
//! Records pushed into the feed are fanned out to every live `updates()`
//! stream. The current-entitlements snapshot is a configurable finite list,
//! which may contain per-item failures to simulate a broken restore.

use std::sync::{Arc, Mutex, MutexGuard};

use futures::channel::mpsc;
use futures::stream::{self, StreamExt};

use crate::domain::entitlement::RawTransaction;
use crate::ports::{FeedError, TransactionFeed, TransactionStream};

type FeedItem = Result<RawTransaction, FeedError>;

/// Transaction feed driven by in-process pushes.
#[derive(Clone, Default)]
pub struct ChannelTransactionFeed {
    inner: Arc<Mutex<FeedState>>,
}

#[derive(Default)]
struct FeedState {
    subscribers: Vec<mpsc::UnboundedSender<FeedItem>>,
    current: Vec<FeedItem>,
}

impl ChannelTransactionFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers a record to every live subscriber.
    ///
    /// Returns the number of subscribers that received it.
    pub fn push(&self, raw: RawTransaction) -> usize {
        self.broadcast(Ok(raw))
    }

    /// Delivers a stream failure to every live subscriber.
    pub fn push_error(&self, error: FeedError) -> usize {
        self.broadcast(Err(error))
    }

    /// Replaces the current-entitlements snapshot.
    pub fn set_current_entitlements(&self, records: impl IntoIterator<Item = RawTransaction>) {
        self.state().current = records.into_iter().map(Ok).collect();
    }

    /// Appends a failure to the current-entitlements snapshot.
    pub fn fail_current_entitlements_with(&self, error: FeedError) {
        self.state().current.push(Err(error));
    }

    /// Ends every live `updates()` stream.
    pub fn close(&self) {
        self.state().subscribers.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        let mut state = self.state();
        state.subscribers.retain(|tx| !tx.is_closed());
        state.subscribers.len()
    }

    fn broadcast(&self, item: FeedItem) -> usize {
        let mut state = self.state();
        state
            .subscribers
            .retain(|tx| tx.unbounded_send(item.clone()).is_ok());
        state.subscribers.len()
    }

    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TransactionFeed for ChannelTransactionFeed {
    fn updates(&self) -> TransactionStream {
        let (tx, rx) = mpsc::unbounded();
        self.state().subscribers.push(tx);
        rx.boxed()
    }

    fn current_entitlements(&self) -> TransactionStream {
        let snapshot = self.state().current.clone();
        stream::iter(snapshot).boxed()
    }
}
