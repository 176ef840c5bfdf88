//! Value objects for checkout.

use common::Money;
use serde::{Deserialize, Serialize};

/// Product identifier (catalog SKU).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a new product ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the product ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A line in the user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CartItem {
    /// Largest quantity the order wire format can carry.
    pub const MAX_QUANTITY: u32 = i32::MAX as u32;

    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }

    /// Whether the line orders at least one unit and fits on the wire.
    pub fn has_valid_quantity(&self) -> bool {
        (1..=Self::MAX_QUANTITY).contains(&self.quantity)
    }
}

/// A catalog entry as returned by the product catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    /// Price in the catalog's reference currency.
    pub price_usd: Money,
}

/// Shipping destination, forwarded untouched to shipping and payment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: i32,
}

/// Payment instrument, forwarded untouched to the payment service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCardInfo {
    pub credit_card_number: String,
    pub credit_card_cvv: i32,
    pub credit_card_expiration_year: i32,
    pub credit_card_expiration_month: i32,
}

impl std::fmt::Debug for CreditCardInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreditCardInfo")
            .field("credit_card_number", &"<redacted>")
            .field("credit_card_cvv", &"<redacted>")
            .field("credit_card_expiration_year", &self.credit_card_expiration_year)
            .field("credit_card_expiration_month", &self.credit_card_expiration_month)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_string_conversion() {
        let id = ProductId::new("OLJCESPC7Z");
        assert_eq!(id.as_str(), "OLJCESPC7Z");

        let id2: ProductId = "66VCHSJNUP".into();
        assert_eq!(id2.to_string(), "66VCHSJNUP");
    }

    #[test]
    fn test_credit_card_debug_is_redacted() {
        let card = CreditCardInfo {
            credit_card_number: "4432-8015-6152-0454".to_string(),
            credit_card_cvv: 672,
            credit_card_expiration_year: 2030,
            credit_card_expiration_month: 1,
        };
        let debug = format!("{card:?}");
        assert!(!debug.contains("4432"));
        assert!(!debug.contains("672"));
        assert!(debug.contains("2030"));
    }

    #[test]
    fn test_cart_item_deserializes() {
        let item: CartItem =
            serde_json::from_str(r#"{"product_id":"L9ECAV7KIM","quantity":3}"#).unwrap();
        assert_eq!(item, CartItem::new("L9ECAV7KIM", 3));
    }

    #[test]
    fn test_cart_item_quantity_bounds() {
        assert!(CartItem::new("L9ECAV7KIM", 1).has_valid_quantity());
        assert!(CartItem::new("L9ECAV7KIM", CartItem::MAX_QUANTITY).has_valid_quantity());
        assert!(!CartItem::new("L9ECAV7KIM", 0).has_valid_quantity());
        assert!(!CartItem::new("L9ECAV7KIM", CartItem::MAX_QUANTITY + 1).has_valid_quantity());
    }
}
