//! Card charging with the payment fault-injection hook.

use std::sync::Arc;

use common::flags::PAYMENT_SERVICE_UNREACHABLE;
use common::{FeatureFlags, Money, RequestContext};
use domain::CreditCardInfo;
use tracing::{info, warn};

use crate::error::{CheckoutError, Result};
use crate::services::PaymentService;

/// Charges the order total.
///
/// When the `paymentServiceUnreachable` flag is on, the charge goes to a
/// deliberately unreachable endpoint instead of the real service and is
/// expected to fail. It is never retried against the real service.
#[derive(Clone)]
pub struct PaymentGate {
    primary: Arc<dyn PaymentService>,
    unreachable: Arc<dyn PaymentService>,
    flags: FeatureFlags,
}

impl PaymentGate {
    pub fn new(
        primary: Arc<dyn PaymentService>,
        unreachable: Arc<dyn PaymentService>,
        flags: FeatureFlags,
    ) -> Self {
        Self {
            primary,
            unreachable,
            flags,
        }
    }

    /// Charges `total` to `card`, returning the transaction ID.
    #[tracing::instrument(skip(self, ctx, card), fields(amount = %total))]
    pub async fn charge(
        &self,
        ctx: &RequestContext,
        total: &Money,
        card: &CreditCardInfo,
    ) -> Result<String> {
        let service = if self.flags.boolean(ctx, PAYMENT_SERVICE_UNREACHABLE).await {
            warn!("paymentServiceUnreachable flag is active, charging unreachable endpoint");
            &self.unreachable
        } else {
            &self.primary
        };

        let transaction_id = ctx
            .run(service.charge(ctx, total, card))
            .await
            .map_err(CheckoutError::PaymentDeclined)?;

        info!(app.payment.transaction.id = %transaction_id, "payment went through");
        Ok(transaction_id)
    }
}
