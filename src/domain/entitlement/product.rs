//! Catalog products offered by the billing platform.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ProductId;

/// How the platform bills a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// Recurring subscription renewed by the platform.
    #[default]
    AutoRenewable,

    /// Consumables, non-consumables and non-renewing subscriptions.
    Other,
}

/// Immutable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub display_name: String,
    /// Localized price string as formatted by the platform.
    pub display_price: String,
    pub kind: ProductKind,
}

impl Product {
    /// Creates an auto-renewable subscription product.
    pub fn subscription(
        id: ProductId,
        display_name: impl Into<String>,
        display_price: impl Into<String>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            display_price: display_price.into(),
            kind: ProductKind::AutoRenewable,
        }
    }

    /// Returns true for auto-renewable subscriptions.
    pub fn is_subscription(&self) -> bool {
        self.kind == ProductKind::AutoRenewable
    }
}
