//! Checkout error types.

use common::{ContextError, MoneyError};
use domain::ProductId;
use thiserror::Error;

use crate::state::SagaState;

/// Errors returned by a downstream collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The service refused the request.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The caller's context ended before the call completed.
    #[error(transparent)]
    Context(#[from] ContextError),
}

/// Failure to mint an order identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("order id generation failed: {0}")]
pub struct IdentityError(pub String);

/// Errors that abort an order placement.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("failed to generate order id: {0}")]
    IdentityGenerationFailed(#[from] IdentityError),

    #[error("failed to get user cart during checkout: {0}")]
    CartUnavailable(#[source] ServiceError),

    #[error("failed to prepare order items for product {product_id}: {source}")]
    PricingUnavailable {
        product_id: ProductId,
        #[source]
        source: ServiceError,
    },

    #[error("shipping quote failure: {0}")]
    ShippingUnavailable(#[source] ServiceError),

    #[error("failed to charge card: {0}")]
    PaymentDeclined(#[source] ServiceError),

    #[error("shipping error: {0}")]
    ShippingFailed(#[source] ServiceError),

    /// Order amounts could not be combined; a bug in pricing, not a user error.
    #[error("failed to compute order total: {0}")]
    InvalidTotal(#[source] MoneyError),
}

impl CheckoutError {
    /// True for failures that happen after the card was charged.
    pub fn is_post_payment(&self) -> bool {
        matches!(self, CheckoutError::ShippingFailed(_))
    }

    /// The saga state in which this error aborts a placement.
    pub fn failed_state(&self) -> SagaState {
        match self {
            CheckoutError::IdentityGenerationFailed(_)
            | CheckoutError::CartUnavailable(_)
            | CheckoutError::PricingUnavailable { .. }
            | CheckoutError::ShippingUnavailable(_)
            | CheckoutError::InvalidTotal(_) => SagaState::Preparing,
            CheckoutError::PaymentDeclined(_) => SagaState::Paying,
            CheckoutError::ShippingFailed(_) => SagaState::Shipping,
        }
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
