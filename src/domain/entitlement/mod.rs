//! Entitlement domain module.
//!
//! Turns a stream of platform transactions into the current set of
//! entitlements and a single subscription status.
//!
//! # Module Structure
//!
//! - `product` - Catalog entries
//! - `transaction` - Raw and ingested transaction records, verification wrapper
//! - `transaction_store` - Deduplicating append-only log
//! - `entitlement_record` - Per-product entitlement and its state
//! - `reconciler` - Pure fold from transactions to entitlements
//! - `status` / `resolver` - Single status across all entitlements
//! - `lifecycle` - Engine state machine
//! - `errors` - Engine and verification error taxonomy

mod entitlement_record;
mod errors;
mod lifecycle;
mod product;
mod reconciler;
mod resolver;
mod status;
mod transaction;
mod transaction_store;

pub use entitlement_record::{Entitlement, EntitlementState};
pub use errors::{EngineError, VerificationError};
pub use lifecycle::EngineState;
pub use product::{Product, ProductKind};
pub use reconciler::{EntitlementReconciler, GracePolicy, DEFAULT_GRACE_PERIOD_DAYS};
pub use resolver::StatusResolver;
pub use status::{SubscriptionState, SubscriptionStatus};
pub use transaction::{RawTransaction, TransactionEvent, Verification, VerificationState};
pub use transaction_store::{IngestOutcome, TransactionStore};
