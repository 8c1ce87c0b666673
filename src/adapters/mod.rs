//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the engine to the billing platform or stand in for it:
//! - `verification` - HMAC and static transaction verifiers
//! - `catalog` - In-memory product catalog
//! - `feed` - In-process transaction feed
//! - `purchase` - Mock purchase flow
//! - `clock` - System and fixed clocks

pub mod catalog;
pub mod clock;
pub mod feed;
pub mod purchase;
pub mod verification;

pub use catalog::StaticCatalogSource;
pub use clock::{FixedClock, SystemClock};
pub use feed::ChannelTransactionFeed;
pub use purchase::MockPurchaseProvider;
pub use verification::{HmacTransactionVerifier, StaticVerifier};
