//! Order identifier generation.

use common::OrderId;

use crate::error::IdentityError;

/// Source of fresh order identifiers.
pub trait OrderIdSource: Send + Sync {
    fn next_id(&self) -> Result<OrderId, IdentityError>;
}

/// Random (UUID v4) order identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomOrderIds;

impl OrderIdSource for RandomOrderIds {
    fn next_id(&self) -> Result<OrderId, IdentityError> {
        Ok(OrderId::new())
    }
}
