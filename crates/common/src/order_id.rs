//! Order identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identifier assigned to an order when placement begins.
///
/// Generated ids are random (version 4) UUIDs. The text form is the
/// lowercase hyphenated UUID, which is also what consumers of published
/// orders receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderId(Uuid);

/// A string that is not a hyphenated UUID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid order id {0:?}")]
pub struct InvalidOrderId(String);

impl OrderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for OrderId {
    type Err = InvalidOrderId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Only the hyphenated layout is accepted; braced, urn and simple forms are not.
        if s.len() != uuid::fmt::Hyphenated::LENGTH {
            return Err(InvalidOrderId(s.to_string()));
        }
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| InvalidOrderId(s.to_string()))
    }
}

impl TryFrom<String> for OrderId {
    type Error = InvalidOrderId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OrderId> for String {
    fn from(id: OrderId) -> Self {
        id.to_string()
    }
}
