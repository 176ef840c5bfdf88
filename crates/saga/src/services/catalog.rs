//! Product catalog trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::RequestContext;
use domain::{Product, ProductId};

use crate::error::ServiceError;

/// Trait for catalog lookups.
#[async_trait]
pub trait ProductCatalogService: Send + Sync {
    /// Returns the product with `id`, priced in the reference currency.
    async fn get_product(&self, ctx: &RequestContext, id: &ProductId)
    -> Result<Product, ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    products: HashMap<ProductId, Product>,
    lookups: usize,
    fail_on_get: bool,
}

/// In-memory product catalog for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogService {
    state: Arc<RwLock<InMemoryCatalogState>>,
}

impl InMemoryCatalogService {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product.
    pub fn add_product(&self, product: Product) {
        self.state
            .write()
            .unwrap()
            .products
            .insert(product.id.clone(), product);
    }

    /// Configures the catalog to fail every lookup.
    pub fn set_fail_on_get(&self, fail: bool) {
        self.state.write().unwrap().fail_on_get = fail;
    }

    /// Returns the number of lookups served or failed.
    pub fn lookup_count(&self) -> usize {
        self.state.read().unwrap().lookups
    }
}

#[async_trait]
impl ProductCatalogService for InMemoryCatalogService {
    async fn get_product(
        &self,
        _ctx: &RequestContext,
        id: &ProductId,
    ) -> Result<Product, ServiceError> {
        let mut state = self.state.write().unwrap();
        state.lookups += 1;

        if state.fail_on_get {
            return Err(ServiceError::Transport("catalog unreachable".to_string()));
        }
        state
            .products
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::Rejected(format!("no product with id {id}")))
    }
}
