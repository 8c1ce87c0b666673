//! Catalog source port - product lookup on the billing platform.

use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entitlement::Product;
use crate::domain::foundation::ProductId;

/// Errors from a catalog query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Platform could not be reached.
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    /// Platform answered with something unusable.
    #[error("Invalid catalog response: {0}")]
    InvalidResponse(String),
}

/// Port for fetching product metadata.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Returns the products known for the given ids.
    ///
    /// Unknown ids are silently omitted, as platforms do.
    async fn fetch_products(&self, ids: &BTreeSet<ProductId>) -> Result<Vec<Product>, CatalogError>;
}
