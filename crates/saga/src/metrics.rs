use metrics::{Counter, Histogram};

use crate::state::SagaState;

/// Checkout instruments, registered once and shared by every saga run.
#[derive(Clone)]
pub struct CheckoutMetrics {
    pub placed: Counter,
    pub duration_seconds: Histogram,
    pub paid_unshipped: Counter,
    failed_preparing: Counter,
    failed_paying: Counter,
    failed_shipping: Counter,
}

impl CheckoutMetrics {
    /// Registers the instruments with the installed global recorder.
    pub fn register() -> Self {
        Self {
            placed: metrics::counter!("checkout_place_order_total"),
            duration_seconds: metrics::histogram!("checkout_place_order_duration_seconds"),
            paid_unshipped: metrics::counter!("checkout_paid_unshipped_orders_total"),
            failed_preparing: metrics::counter!("checkout_place_order_failed_total", "step" => "Preparing"),
            failed_paying: metrics::counter!("checkout_place_order_failed_total", "step" => "Paying"),
            failed_shipping: metrics::counter!("checkout_place_order_failed_total", "step" => "Shipping"),
        }
    }

    /// Instruments that record nothing.
    pub fn noop() -> Self {
        Self {
            placed: Counter::noop(),
            duration_seconds: Histogram::noop(),
            paid_unshipped: Counter::noop(),
            failed_preparing: Counter::noop(),
            failed_paying: Counter::noop(),
            failed_shipping: Counter::noop(),
        }
    }

    /// Counts an abort in `state`.
    pub fn record_failure(&self, state: SagaState) {
        match state {
            SagaState::Preparing => self.failed_preparing.increment(1),
            SagaState::Paying => self.failed_paying.increment(1),
            SagaState::Shipping => self.failed_shipping.increment(1),
            SagaState::Finalizing | SagaState::Done | SagaState::Aborted => {}
        }
    }
}

impl std::fmt::Debug for CheckoutMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutMetrics").finish_non_exhaustive()
    }
}
