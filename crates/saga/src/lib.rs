//! Order placement saga for checkout.
//!
//! A placement runs these steps in order:
//! 1. Generate an order ID
//! 2. Prepare the order: cart, localized prices, shipping quote
//! 3. Charge the total
//! 4. Ship the items
//! 5. Finalize best-effort: empty the cart, send the confirmation, publish the event
//!
//! Steps 1 to 4 abort the placement on failure. Nothing is retried or
//! compensated; a shipping failure after payment is surfaced to operators.

pub mod coordinator;
pub mod error;
pub mod fulfillment;
pub mod identity;
pub mod metrics;
pub mod notification;
pub mod payment_gate;
pub mod preparer;
pub mod services;
pub mod state;

pub use coordinator::{CheckoutSaga, CheckoutServices, PlaceOrderRequest};
pub use error::{CheckoutError, IdentityError, Result, ServiceError};
pub use fulfillment::FulfillmentDispatcher;
pub use identity::{OrderIdSource, RandomOrderIds};
pub use metrics::CheckoutMetrics;
pub use notification::NotificationSender;
pub use payment_gate::PaymentGate;
pub use preparer::OrderPreparer;
pub use services::{
    CartService, CurrencyService, EmailService, InMemoryCartService, InMemoryCatalogService,
    InMemoryCurrencyService, InMemoryEmailService, InMemoryPaymentService,
    InMemoryShippingService, PaymentService, ProductCatalogService, ShippingService,
};
pub use state::SagaState;
