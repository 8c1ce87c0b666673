//! In-memory catalog source.
//!
//! Serves a fixed product list, typically built from `CatalogConfig`. Errors
//! can be injected to exercise catalog-load failure paths.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::entitlement::Product;
use crate::domain::foundation::ProductId;
use crate::ports::{CatalogError, CatalogSource};

/// Catalog source backed by a fixed product list.
#[derive(Clone, Default)]
pub struct StaticCatalogSource {
    inner: Arc<Mutex<CatalogState>>,
}

#[derive(Default)]
struct CatalogState {
    products: BTreeMap<ProductId, Product>,
    /// Returned by every fetch until cleared.
    error: Option<CatalogError>,
    fetch_count: usize,
}

impl StaticCatalogSource {
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        let source = Self::default();
        {
            let mut state = source.state();
            for product in products {
                state.products.insert(product.id.clone(), product);
            }
        }
        source
    }

    /// A source whose every fetch fails with `error`.
    pub fn failing(error: CatalogError) -> Self {
        let source = Self::default();
        source.set_error(error);
        source
    }

    pub fn set_error(&self, error: CatalogError) {
        self.state().error = Some(error);
    }

    pub fn clear_error(&self) {
        self.state().error = None;
    }

    /// Number of fetches served so far, failed ones included.
    pub fn fetch_count(&self) -> usize {
        self.state().fetch_count
    }

    fn state(&self) -> MutexGuard<'_, CatalogState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CatalogSource for StaticCatalogSource {
    async fn fetch_products(&self, ids: &BTreeSet<ProductId>) -> Result<Vec<Product>, CatalogError> {
        let mut state = self.state();
        state.fetch_count += 1;

        if let Some(error) = &state.error {
            return Err(error.clone());
        }

        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id).cloned())
            .collect())
    }
}
