//! Checkout order model.
//!
//! Nothing here is persisted; every value lives for one checkout request.

pub mod preparation;
pub mod result;
pub mod value_objects;

pub use preparation::{OrderItem, OrderPreparation};
pub use result::OrderResult;
pub use value_objects::{Address, CartItem, CreditCardInfo, Product, ProductId};
