//! Cart service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::RequestContext;
use domain::CartItem;

use crate::error::ServiceError;

/// Trait for reading and clearing user carts.
#[async_trait]
pub trait CartService: Send + Sync {
    /// Returns the items in `user_id`'s cart.
    async fn get_cart(&self, ctx: &RequestContext, user_id: &str)
    -> Result<Vec<CartItem>, ServiceError>;

    /// Removes every item from `user_id`'s cart.
    async fn empty_cart(&self, ctx: &RequestContext, user_id: &str) -> Result<(), ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryCartState {
    carts: HashMap<String, Vec<CartItem>>,
    get_calls: usize,
    empty_calls: usize,
    fail_on_get: bool,
    fail_on_empty: bool,
}

/// In-memory cart service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartService {
    state: Arc<RwLock<InMemoryCartState>>,
}

impl InMemoryCartService {
    /// Creates a new in-memory cart service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces `user_id`'s cart.
    pub fn set_cart(&self, user_id: &str, items: Vec<CartItem>) {
        self.state
            .write()
            .unwrap()
            .carts
            .insert(user_id.to_string(), items);
    }

    /// Configures the service to fail every cart read.
    pub fn set_fail_on_get(&self, fail: bool) {
        self.state.write().unwrap().fail_on_get = fail;
    }

    /// Configures the service to fail every cart clear.
    pub fn set_fail_on_empty(&self, fail: bool) {
        self.state.write().unwrap().fail_on_empty = fail;
    }

    /// Returns the current items in `user_id`'s cart.
    pub fn cart(&self, user_id: &str) -> Vec<CartItem> {
        self.state
            .read()
            .unwrap()
            .carts
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the number of empty calls, successful or not.
    pub fn empty_count(&self) -> usize {
        self.state.read().unwrap().empty_calls
    }

    /// Returns the number of get calls, successful or not.
    pub fn get_count(&self) -> usize {
        self.state.read().unwrap().get_calls
    }
}

#[async_trait]
impl CartService for InMemoryCartService {
    async fn get_cart(
        &self,
        _ctx: &RequestContext,
        user_id: &str,
    ) -> Result<Vec<CartItem>, ServiceError> {
        let mut state = self.state.write().unwrap();
        state.get_calls += 1;

        if state.fail_on_get {
            return Err(ServiceError::Transport("cart store unreachable".to_string()));
        }
        Ok(state.carts.get(user_id).cloned().unwrap_or_default())
    }

    async fn empty_cart(&self, _ctx: &RequestContext, user_id: &str) -> Result<(), ServiceError> {
        let mut state = self.state.write().unwrap();
        state.empty_calls += 1;

        if state.fail_on_empty {
            return Err(ServiceError::Transport("cart store unreachable".to_string()));
        }
        state.carts.remove(user_id);
        Ok(())
    }
}
