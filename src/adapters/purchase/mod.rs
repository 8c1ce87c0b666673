//! Purchase provider adapters.

mod mock_purchase_provider;

pub use mock_purchase_provider::MockPurchaseProvider;
