//! Background listener for live transaction updates.
//!
//! One tokio task consumes `TransactionFeed::updates()` and runs an ingest
//! cycle per record. The task stops when:
//!
//! - `ListenerHandle::cancel` is called
//! - the handle is dropped
//! - the feed ends
//!
//! A cycle that is still verifying when shutdown arrives is dropped. The
//! commit step has no await points, so a cycle is either fully applied or
//! not applied at all.

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};

use super::subscription_engine::SubscriptionEngine;
use crate::ports::TransactionStream;

/// Owner's handle to a running listener.
///
/// Not restartable: once cancelled, start a new listener with
/// `SubscriptionEngine::start_listening`.
pub struct ListenerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<usize>,
}

impl ListenerHandle {
    /// Signals shutdown and waits for the task to finish.
    ///
    /// Returns the number of records the listener processed.
    pub async fn cancel(self) -> Result<usize, JoinError> {
        // The task may already be gone if the feed ended.
        let _ = self.shutdown.send(true);
        self.task.await
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl SubscriptionEngine {
    /// Spawns a listener on the injected feed's live updates.
    pub fn start_listening(&self) -> ListenerHandle {
        let updates = self.feed_updates();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let engine = self.clone();

        let task = tokio::spawn(async move { engine.listen(updates, shutdown_rx).await });

        ListenerHandle { shutdown, task }
    }

    async fn listen(self, mut updates: TransactionStream, mut shutdown: watch::Receiver<bool>) -> usize {
        tracing::info!("Transaction listener started");
        let mut processed = 0;

        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                item = updates.next() => item,
            };

            match next {
                Some(Ok(raw)) => {
                    let transaction_id = raw.transaction_id.clone();
                    tokio::select! {
                        biased;
                        _ = shutdown_requested(&mut shutdown) => {
                            tracing::debug!(
                                transaction_id = %transaction_id,
                                "Dropping in-flight transaction on shutdown"
                            );
                            break;
                        }
                        result = self.ingest_transaction_feed(raw) => {
                            processed += 1;
                            if let Err(e) = result {
                                tracing::error!(
                                    transaction_id = %transaction_id,
                                    error = %e,
                                    "Ingest cycle failed"
                                );
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Transaction feed yielded an error");
                    self.record_feed_error(&e).await;
                }
                None => {
                    tracing::info!("Transaction feed ended");
                    break;
                }
            }
        }

        tracing::info!(processed, "Transaction listener stopped");
        processed
    }
}

/// Resolves once shutdown is signalled or the handle is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
