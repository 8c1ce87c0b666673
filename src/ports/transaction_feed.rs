//! Transaction feed port - streams of raw records from the platform.
//!
//! Two views of the same source:
//!
//! - `updates` is lazy, ordered and potentially infinite; it yields every
//!   transaction the platform pushes after subscription.
//! - `current_entitlements` is finite; it yields the platform's view of what
//!   the user owns right now and is used for restores.

use futures::stream::BoxStream;
use thiserror::Error;

use crate::domain::entitlement::RawTransaction;

/// Errors yielded by a feed stream item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// Connection to the platform dropped.
    #[error("Feed disconnected: {0}")]
    Disconnected(String),

    /// A record could not be decoded.
    #[error("Malformed record: {0}")]
    Malformed(String),
}

/// Stream of raw records or per-item failures.
pub type TransactionStream = BoxStream<'static, Result<RawTransaction, FeedError>>;

/// Port for subscribing to platform transactions.
pub trait TransactionFeed: Send + Sync {
    /// Live updates, starting from the moment of the call.
    fn updates(&self) -> TransactionStream;

    /// Finite snapshot of the user's current entitlements.
    fn current_entitlements(&self) -> TransactionStream;
}
