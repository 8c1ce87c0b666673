//! Application layer - the subscription engine facade.
//!
//! Coordinates verification, the transaction store, reconciliation and the
//! live-update listener over the ports injected at construction.

mod listener;
mod snapshot;
mod subscription_engine;

pub use listener::ListenerHandle;
pub use snapshot::EngineSnapshot;
pub use subscription_engine::{
    EngineCollaborators, EngineSettings, PurchaseOutcome, SubscriptionEngine,
    DEFAULT_COLLABORATOR_TIMEOUT,
};
