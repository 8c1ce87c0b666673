//! Entitlement Engine - subscription state from billing platform transactions
//!
//! This crate ingests purchase transactions from an external store, classifies
//! their authenticity through a pluggable verifier, reconciles them into one
//! entitlement per product and resolves a single subscription status.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
