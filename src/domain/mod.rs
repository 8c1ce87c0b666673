//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `entitlement` - Transaction ingestion, reconciliation and status resolution

pub mod entitlement;
pub mod foundation;
