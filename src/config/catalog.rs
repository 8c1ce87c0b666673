//! Product catalog configuration
//!
//! Lists the products the catalog source serves, each with its display
//! metadata. Entries carry their id as a field: `config` lowercases table
//! keys, and platform product ids are case-sensitive. Ids contain dots, so the
//! catalog normally lives in the config file rather than in environment
//! variables.
//!
//! ```toml
//! [[catalog.products]]
//! id = "com.example.App.premiumMonth"
//! display_name = "Monthly"
//! display_price = "$4.99"
//! ```

use std::collections::BTreeSet;

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::entitlement::{Product, ProductKind};
use crate::domain::foundation::ProductId;

/// Configured products
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub products: Vec<ProductConfig>,
}

/// Display metadata for one product
#[derive(Debug, Clone, Deserialize)]
pub struct ProductConfig {
    /// Platform product id, matched case-sensitively against transactions
    pub id: String,

    pub display_name: String,

    /// Price string shown to users, e.g. "$4.99"
    #[serde(default)]
    pub display_price: String,

    #[serde(default)]
    pub kind: ProductKind,
}

impl ProductConfig {
    fn product_id(&self) -> Result<ProductId, ValidationError> {
        ProductId::new(self.id.as_str()).map_err(|_| ValidationError::EmptyProductId)
    }
}

impl CatalogConfig {
    /// Ids requested from the catalog source at startup
    pub fn product_ids(&self) -> Result<BTreeSet<ProductId>, ValidationError> {
        self.products.iter().map(ProductConfig::product_id).collect()
    }

    /// Catalog entries built from the configured metadata
    pub fn products(&self) -> Result<Vec<Product>, ValidationError> {
        self.products
            .iter()
            .map(|product| {
                Ok(Product {
                    id: product.product_id()?,
                    display_name: product.display_name.clone(),
                    display_price: product.display_price.clone(),
                    kind: product.kind,
                })
            })
            .collect()
    }

    /// Validate catalog configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = BTreeSet::new();
        for product in &self.products {
            if product.id.trim().is_empty() {
                return Err(ValidationError::EmptyProductId);
            }
            if !seen.insert(product.id.as_str()) {
                return Err(ValidationError::DuplicateProductId(product.id.clone()));
            }
            if product.display_name.trim().is_empty() {
                return Err(ValidationError::MissingDisplayName(product.id.clone()));
            }
        }
        Ok(())
    }
}
