//! Append-only log of observed transactions.
//!
//! # Invariants
//!
//! - No two events share a transaction id; the first delivery wins
//! - Events are never modified or removed once ingested
//! - `by_product` only ever points at verified events

use std::collections::{HashMap, HashSet};

use super::transaction::TransactionEvent;
use crate::domain::foundation::{ProductId, TransactionId};

/// Result of offering an event to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The event was new and has been appended.
    Accepted,
    /// An event with the same transaction id was already present.
    Duplicate,
}

/// In-memory transaction log with a per-product index.
#[derive(Debug, Clone, Default)]
pub struct TransactionStore {
    events: Vec<TransactionEvent>,
    seen: HashSet<TransactionId>,
    /// Position in `events` of the latest verified event per product.
    latest_by_product: HashMap<ProductId, usize>,
}

impl TransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event unless its transaction id is already known.
    pub fn ingest(&mut self, event: TransactionEvent) -> IngestOutcome {
        if !self.seen.insert(event.transaction_id.clone()) {
            return IngestOutcome::Duplicate;
        }

        let position = self.events.len();
        if event.is_verified() {
            let replace = match self.latest_by_product.get(&event.product_id) {
                Some(&current) => event.supersedes(&self.events[current]),
                None => true,
            };
            if replace {
                self.latest_by_product.insert(event.product_id.clone(), position);
            }
        }

        self.events.push(event);
        IngestOutcome::Accepted
    }

    /// All events in insertion order, verified or not.
    pub fn all(&self) -> &[TransactionEvent] {
        &self.events
    }

    /// Latest verified event recorded for a product.
    pub fn by_product(&self, product_id: &ProductId) -> Option<&TransactionEvent> {
        self.latest_by_product
            .get(product_id)
            .map(|&position| &self.events[position])
    }

    pub fn verified(&self) -> impl Iterator<Item = &TransactionEvent> {
        self.events.iter().filter(|e| e.is_verified())
    }

    /// Events kept for audit only; they never feed reconciliation.
    pub fn unverified(&self) -> impl Iterator<Item = &TransactionEvent> {
        self.events.iter().filter(|e| !e.is_verified())
    }

    pub fn contains(&self, transaction_id: &TransactionId) -> bool {
        self.seen.contains(transaction_id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
