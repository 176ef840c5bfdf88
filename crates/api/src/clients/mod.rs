//! Network clients for collaborator services and the flag backend.

pub mod flagd;
pub mod http;
pub mod services;

pub use flagd::FlagdProvider;
pub use http::JsonClient;
pub use services::{
    HttpCartService, HttpCatalogService, HttpCurrencyService, HttpEmailService,
    HttpPaymentService, HttpShippingService, UNREACHABLE_PAYMENT_ADDR,
};
