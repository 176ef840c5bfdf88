//! The order returned to the caller and published on the bus.

use common::{Money, OrderId};
use serde::{Deserialize, Serialize};

use super::preparation::OrderItem;
use super::value_objects::Address;

/// Outcome of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResult {
    pub order_id: OrderId,
    pub shipping_tracking_id: String,
    pub shipping_cost: Money,
    pub shipping_address: Address,
    pub items: Vec<OrderItem>,
}
