//! Protobuf encoding of [`OrderResult`] for the message bus.
//!
//! Field numbers follow the storefront's shared `OrderResult` schema so
//! existing consumers can decode the payload.

use common::{Money, MoneyError, OrderId};
use prost::Message;
use thiserror::Error;

use crate::order::{Address, CartItem, OrderItem, OrderResult, ProductId};

/// Errors raised while encoding an order for publication.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("quantity {quantity} of product {product_id} does not fit the wire format")]
    QuantityOutOfRange { product_id: ProductId, quantity: u32 },
}

/// Errors raised while decoding a published order.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("protobuf decode error: {0}")]
    Protobuf(#[from] prost::DecodeError),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid order id: {0}")]
    InvalidOrderId(String),

    #[error("invalid quantity {0}")]
    InvalidQuantity(i32),

    #[error("invalid money: {0}")]
    Money(#[from] MoneyError),
}

#[derive(Clone, PartialEq, Message)]
pub struct MoneyMessage {
    #[prost(string, tag = "1")]
    pub currency_code: String,
    #[prost(int64, tag = "2")]
    pub units: i64,
    #[prost(int32, tag = "3")]
    pub nanos: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct CartItemMessage {
    #[prost(string, tag = "1")]
    pub product_id: String,
    #[prost(int32, tag = "2")]
    pub quantity: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct OrderItemMessage {
    #[prost(message, optional, tag = "1")]
    pub item: Option<CartItemMessage>,
    #[prost(message, optional, tag = "2")]
    pub cost: Option<MoneyMessage>,
}

#[derive(Clone, PartialEq, Message)]
pub struct AddressMessage {
    #[prost(string, tag = "1")]
    pub street_address: String,
    #[prost(string, tag = "2")]
    pub city: String,
    #[prost(string, tag = "3")]
    pub state: String,
    #[prost(string, tag = "4")]
    pub country: String,
    #[prost(int32, tag = "5")]
    pub zip_code: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct OrderResultMessage {
    #[prost(string, tag = "1")]
    pub order_id: String,
    #[prost(string, tag = "2")]
    pub shipping_tracking_id: String,
    #[prost(message, optional, tag = "3")]
    pub shipping_cost: Option<MoneyMessage>,
    #[prost(message, optional, tag = "4")]
    pub shipping_address: Option<AddressMessage>,
    #[prost(message, repeated, tag = "5")]
    pub items: Vec<OrderItemMessage>,
}

/// Encodes an order result to its binary wire form.
pub fn encode_order_result(order: &OrderResult) -> Result<Vec<u8>, EncodeError> {
    Ok(OrderResultMessage::try_from(order)?.encode_to_vec())
}

/// Decodes an order result from its binary wire form.
pub fn decode_order_result(bytes: &[u8]) -> Result<OrderResult, DecodeError> {
    OrderResultMessage::decode(bytes)?.try_into()
}

impl From<&Money> for MoneyMessage {
    fn from(money: &Money) -> Self {
        Self {
            currency_code: money.currency_code().to_string(),
            units: money.units(),
            nanos: money.nanos(),
        }
    }
}

impl TryFrom<&CartItem> for CartItemMessage {
    type Error = EncodeError;

    fn try_from(item: &CartItem) -> Result<Self, Self::Error> {
        let quantity =
            i32::try_from(item.quantity).map_err(|_| EncodeError::QuantityOutOfRange {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
            })?;
        Ok(Self {
            product_id: item.product_id.to_string(),
            quantity,
        })
    }
}

impl From<&Address> for AddressMessage {
    fn from(address: &Address) -> Self {
        Self {
            street_address: address.street_address.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            country: address.country.clone(),
            zip_code: address.zip_code,
        }
    }
}

impl TryFrom<&OrderResult> for OrderResultMessage {
    type Error = EncodeError;

    fn try_from(order: &OrderResult) -> Result<Self, Self::Error> {
        let items = order
            .items
            .iter()
            .map(|item| {
                Ok(OrderItemMessage {
                    item: Some(CartItemMessage::try_from(&item.item)?),
                    cost: Some(MoneyMessage::from(&item.cost)),
                })
            })
            .collect::<Result<Vec<_>, EncodeError>>()?;
        Ok(Self {
            order_id: order.order_id.to_string(),
            shipping_tracking_id: order.shipping_tracking_id.clone(),
            shipping_cost: Some(MoneyMessage::from(&order.shipping_cost)),
            shipping_address: Some(AddressMessage::from(&order.shipping_address)),
            items,
        })
    }
}

impl TryFrom<MoneyMessage> for Money {
    type Error = DecodeError;

    fn try_from(message: MoneyMessage) -> Result<Self, Self::Error> {
        Ok(Money::new(message.currency_code, message.units, message.nanos)?)
    }
}

impl TryFrom<OrderResultMessage> for OrderResult {
    type Error = DecodeError;

    fn try_from(message: OrderResultMessage) -> Result<Self, Self::Error> {
        let order_id: OrderId = message
            .order_id
            .parse()
            .map_err(|_| DecodeError::InvalidOrderId(message.order_id.clone()))?;
        let shipping_cost: Money = message
            .shipping_cost
            .ok_or(DecodeError::MissingField("shipping_cost"))?
            .try_into()?;
        let address = message.shipping_address.unwrap_or_default();
        let items = message
            .items
            .into_iter()
            .map(|item| {
                let cart = item.item.ok_or(DecodeError::MissingField("items.item"))?;
                let quantity = u32::try_from(cart.quantity)
                    .ok()
                    .filter(|quantity| *quantity > 0)
                    .ok_or(DecodeError::InvalidQuantity(cart.quantity))?;
                let cost: Money = item
                    .cost
                    .ok_or(DecodeError::MissingField("items.cost"))?
                    .try_into()?;
                Ok(OrderItem::new(
                    CartItem::new(ProductId::new(cart.product_id), quantity),
                    cost,
                ))
            })
            .collect::<Result<Vec<_>, DecodeError>>()?;

        Ok(OrderResult {
            order_id,
            shipping_tracking_id: message.shipping_tracking_id,
            shipping_cost,
            shipping_address: Address {
                street_address: address.street_address,
                city: address.city,
                state: address.state,
                country: address.country,
                zip_code: address.zip_code,
            },
            items,
        })
    }
}
