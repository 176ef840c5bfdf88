//! Domain layer for checkout.
//!
//! This crate provides the request-scoped checkout model:
//! - Cart lines, catalog products, addresses and payment instruments
//! - Priced order items and the order total
//! - The `OrderResult` returned to callers, and its protobuf wire encoding

pub mod order;
pub mod wire;

pub use order::{
    Address, CartItem, CreditCardInfo, OrderItem, OrderPreparation, OrderResult, Product,
    ProductId,
};
pub use wire::{DecodeError, EncodeError, decode_order_result, encode_order_result};
