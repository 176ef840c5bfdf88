//! Shipping service trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Money, RequestContext};
use domain::{Address, CartItem};

use crate::error::ServiceError;

/// Trait for shipping quotes and dispatch.
#[async_trait]
pub trait ShippingService: Send + Sync {
    /// Quotes the cost of shipping `items` to `address`, in the reference currency.
    async fn get_quote(
        &self,
        ctx: &RequestContext,
        address: &Address,
        items: &[CartItem],
    ) -> Result<Money, ServiceError>;

    /// Ships `items` to `address`, returning the tracking ID.
    async fn ship_order(
        &self,
        ctx: &RequestContext,
        address: &Address,
        items: &[CartItem],
    ) -> Result<String, ServiceError>;
}

#[derive(Debug)]
struct InMemoryShippingState {
    quote: Money,
    shipments: Vec<(String, Vec<CartItem>)>,
    quote_calls: usize,
    ship_calls: usize,
    next_id: u32,
    fail_on_quote: bool,
    fail_on_ship: bool,
}

/// In-memory shipping service for testing.
#[derive(Debug, Clone)]
pub struct InMemoryShippingService {
    state: Arc<RwLock<InMemoryShippingState>>,
}

impl InMemoryShippingService {
    /// Creates a service quoting a flat `quote` for every order.
    pub fn new(quote: Money) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryShippingState {
                quote,
                shipments: Vec::new(),
                quote_calls: 0,
                ship_calls: 0,
                next_id: 0,
                fail_on_quote: false,
                fail_on_ship: false,
            })),
        }
    }

    /// Configures the service to fail every quote.
    pub fn set_fail_on_quote(&self, fail: bool) {
        self.state.write().unwrap().fail_on_quote = fail;
    }

    /// Configures the service to fail every shipment.
    pub fn set_fail_on_ship(&self, fail: bool) {
        self.state.write().unwrap().fail_on_ship = fail;
    }

    /// Returns the number of quote calls.
    pub fn quote_count(&self) -> usize {
        self.state.read().unwrap().quote_calls
    }

    /// Returns the number of ship calls, successful or not.
    pub fn ship_count(&self) -> usize {
        self.state.read().unwrap().ship_calls
    }

    /// Returns the number of dispatched shipments.
    pub fn shipment_count(&self) -> usize {
        self.state.read().unwrap().shipments.len()
    }

    /// Returns the items shipped under `tracking_id`.
    pub fn shipped_items(&self, tracking_id: &str) -> Option<Vec<CartItem>> {
        self.state
            .read()
            .unwrap()
            .shipments
            .iter()
            .find(|(id, _)| id == tracking_id)
            .map(|(_, items)| items.clone())
    }
}

#[async_trait]
impl ShippingService for InMemoryShippingService {
    async fn get_quote(
        &self,
        _ctx: &RequestContext,
        _address: &Address,
        _items: &[CartItem],
    ) -> Result<Money, ServiceError> {
        let mut state = self.state.write().unwrap();
        state.quote_calls += 1;

        if state.fail_on_quote {
            return Err(ServiceError::Rejected("quote unavailable".to_string()));
        }
        Ok(state.quote.clone())
    }

    async fn ship_order(
        &self,
        _ctx: &RequestContext,
        _address: &Address,
        items: &[CartItem],
    ) -> Result<String, ServiceError> {
        let mut state = self.state.write().unwrap();
        state.ship_calls += 1;

        if state.fail_on_ship {
            return Err(ServiceError::Rejected("shipping unavailable".to_string()));
        }

        state.next_id += 1;
        let tracking_id = format!("TRACK-{:04}", state.next_id);
        state.shipments.push((tracking_id.clone(), items.to_vec()));

        Ok(tracking_id)
    }
}
