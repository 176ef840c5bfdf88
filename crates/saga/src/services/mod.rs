//! Downstream collaborator traits and in-memory implementations.

pub mod cart;
pub mod catalog;
pub mod currency;
pub mod email;
pub mod payment;
pub mod shipping;

pub use cart::{CartService, InMemoryCartService};
pub use catalog::{InMemoryCatalogService, ProductCatalogService};
pub use currency::{CurrencyService, InMemoryCurrencyService};
pub use email::{EmailService, InMemoryEmailService};
pub use payment::{InMemoryPaymentService, PaymentService};
pub use shipping::{InMemoryShippingService, ShippingService};
