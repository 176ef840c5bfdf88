//! Priced order items and the order total.

use common::{Money, MoneyError};
use serde::{Deserialize, Serialize};

use super::value_objects::CartItem;

/// A cart line together with its unit cost in the user's currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub item: CartItem,
    /// Localized cost of a single unit.
    pub cost: Money,
}

impl OrderItem {
    pub fn new(item: CartItem, cost: Money) -> Self {
        Self { item, cost }
    }

    /// Unit cost multiplied by quantity.
    pub fn line_total(&self) -> Result<Money, MoneyError> {
        self.cost.multiply(self.item.quantity)
    }
}

/// Everything gathered before charging: priced items, the cart they came
/// from, and the localized shipping cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPreparation {
    pub order_items: Vec<OrderItem>,
    pub cart_items: Vec<CartItem>,
    pub shipping_cost: Money,
}

impl OrderPreparation {
    /// Shipping cost plus the sum of every line total, in `currency_code`.
    ///
    /// Fails if any amount is in a different currency or the sum overflows.
    pub fn total(&self, currency_code: &str) -> Result<Money, MoneyError> {
        let mut total = Money::zero(currency_code)?.sum(&self.shipping_cost)?;
        for item in &self.order_items {
            total = total.sum(&item.line_total()?)?;
        }
        Ok(total)
    }
}
