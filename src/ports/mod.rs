//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the entitlement domain and the billing platform. Adapters implement them.
//!
//! - `Verifier` - Authenticity check for raw transactions
//! - `CatalogSource` - Product metadata lookup
//! - `TransactionFeed` - Live updates and current-entitlement snapshots
//! - `PurchaseProvider` - Platform purchase flow
//! - `Clock` - Time source for expiration checks

mod catalog_source;
mod clock;
mod purchase_provider;
mod transaction_feed;
mod verifier;

pub use catalog_source::{CatalogError, CatalogSource};
pub use clock::Clock;
pub use purchase_provider::{PurchaseError, PurchaseProvider, PurchaseResult};
pub use transaction_feed::{FeedError, TransactionFeed, TransactionStream};
pub use verifier::Verifier;
