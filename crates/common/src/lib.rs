//! Shared building blocks for the checkout service.
//!
//! - [`Money`]: currency-tagged fixed-point amounts with exact arithmetic
//! - [`OrderId`]: identifier of a placed order
//! - [`TraceContext`] / [`RequestContext`]: trace propagation, deadlines and cancellation
//! - [`FeatureFlags`]: best-effort feature flag oracle

pub mod context;
pub mod flags;
pub mod money;
pub mod order_id;
pub mod trace;

pub use context::{CancelHandle, ContextError, RequestContext};
pub use flags::{FeatureFlags, FlagError, FlagProvider, FlagValue, InMemoryFlagProvider};
pub use money::{Money, MoneyError, NANOS_PER_UNIT, is_valid_currency_code};
pub use order_id::{InvalidOrderId, OrderId};
pub use trace::TraceContext;
