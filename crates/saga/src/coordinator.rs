//! Order placement saga.

use std::sync::Arc;
use std::time::Instant;

use common::{FeatureFlags, RequestContext};
use domain::{Address, CreditCardInfo, OrderResult};
use event_publisher::EventPublisher;
use serde::{Deserialize, Serialize};
use tracing::{Span, debug, error, info};

use crate::error::{CheckoutError, Result};
use crate::fulfillment::FulfillmentDispatcher;
use crate::identity::{OrderIdSource, RandomOrderIds};
use crate::metrics::CheckoutMetrics;
use crate::notification::NotificationSender;
use crate::payment_gate::PaymentGate;
use crate::preparer::OrderPreparer;
use crate::services::{
    CartService, CurrencyService, EmailService, PaymentService, ProductCatalogService,
    ShippingService,
};
use crate::state::SagaState;

/// A request to place an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub user_id: String,
    pub user_currency: String,
    pub address: Address,
    pub email: String,
    pub credit_card: CreditCardInfo,
}

/// Downstream collaborators used by the saga.
#[derive(Clone)]
pub struct CheckoutServices {
    pub cart: Arc<dyn CartService>,
    pub catalog: Arc<dyn ProductCatalogService>,
    pub currency: Arc<dyn CurrencyService>,
    pub shipping: Arc<dyn ShippingService>,
    pub payment: Arc<dyn PaymentService>,
    /// Payment endpoint used while the payment fault-injection flag is on.
    pub unreachable_payment: Arc<dyn PaymentService>,
    pub email: Arc<dyn EmailService>,
}

/// Orchestrates order placement.
///
/// The saga runs `Preparing → Paying → Shipping → Finalizing → Done`.
/// A failure while preparing, paying or shipping aborts it; nothing is
/// retried or compensated. In particular a shipping failure after a
/// successful charge leaves the order paid but unshipped, which is logged
/// and counted for operators.
pub struct CheckoutSaga {
    ids: Arc<dyn OrderIdSource>,
    preparer: OrderPreparer,
    payment: PaymentGate,
    fulfillment: FulfillmentDispatcher,
    notifications: NotificationSender,
    publisher: Option<EventPublisher>,
    metrics: CheckoutMetrics,
}

impl CheckoutSaga {
    /// Creates a saga without event publication.
    pub fn new(services: CheckoutServices, flags: FeatureFlags, metrics: CheckoutMetrics) -> Self {
        Self {
            ids: Arc::new(RandomOrderIds),
            preparer: OrderPreparer::new(
                services.cart.clone(),
                services.catalog,
                services.currency,
                services.shipping.clone(),
            ),
            payment: PaymentGate::new(services.payment, services.unreachable_payment, flags),
            fulfillment: FulfillmentDispatcher::new(services.shipping, services.cart),
            notifications: NotificationSender::new(services.email),
            publisher: None,
            metrics,
        }
    }

    /// Publishes every placed order through `publisher`.
    pub fn with_publisher(mut self, publisher: EventPublisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Replaces the order ID source.
    pub fn with_id_source(mut self, ids: Arc<dyn OrderIdSource>) -> Self {
        self.ids = ids;
        self
    }

    /// Returns true if placed orders are published.
    pub fn publishes_events(&self) -> bool {
        self.publisher.is_some()
    }

    /// Places an order: prepare, charge, ship, then finalize best-effort.
    #[tracing::instrument(
        skip_all,
        fields(
            app.user.id = %request.user_id,
            app.user.currency = %request.user_currency,
            app.order.id = tracing::field::Empty,
        )
    )]
    pub async fn place_order(
        &self,
        ctx: &RequestContext,
        request: &PlaceOrderRequest,
    ) -> Result<OrderResult> {
        info!("placing order");
        let started = Instant::now();

        let result = self.execute(ctx, request).await;
        self.metrics
            .duration_seconds
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(order) => {
                self.metrics.placed.increment(1);
                info!(
                    app.order.id = %order.order_id,
                    app.shipping.tracking.id = %order.shipping_tracking_id,
                    app.order.items.count = order.items.len(),
                    "order placed"
                );
            }
            Err(err) => {
                let mut state = err.failed_state();
                self.metrics.record_failure(state);
                error!(state = %state, error = %err, "order placement aborted");
                advance(&mut state, SagaState::Aborted);
            }
        }
        result
    }

    async fn execute(&self, ctx: &RequestContext, request: &PlaceOrderRequest) -> Result<OrderResult> {
        let mut state = SagaState::Preparing;

        let order_id = self.ids.next_id()?;
        Span::current().record("app.order.id", tracing::field::display(order_id));

        let prep = self
            .preparer
            .prepare(ctx, &request.user_id, &request.user_currency, &request.address)
            .await?;
        let total = prep
            .total(&request.user_currency)
            .map_err(CheckoutError::InvalidTotal)?;
        debug!(total = %total, "order total computed");

        advance(&mut state, SagaState::Paying);
        let transaction_id = self
            .payment
            .charge(ctx, &total, &request.credit_card)
            .await?;

        advance(&mut state, SagaState::Shipping);
        let tracking_id = match self
            .fulfillment
            .ship(ctx, &request.address, &prep.cart_items)
            .await
        {
            Ok(tracking_id) => tracking_id,
            Err(err) => {
                self.metrics.paid_unshipped.increment(1);
                error!(
                    app.order.id = %order_id,
                    app.payment.transaction.id = %transaction_id,
                    amount = %total,
                    error = %err,
                    "order charged but not shipped, no refund issued"
                );
                return Err(err);
            }
        };

        advance(&mut state, SagaState::Finalizing);
        self.fulfillment.reset_cart(ctx, &request.user_id).await;

        let order = OrderResult {
            order_id,
            shipping_tracking_id: tracking_id,
            shipping_cost: prep.shipping_cost,
            shipping_address: request.address.clone(),
            items: prep.order_items,
        };

        self.notifications.notify(ctx, &request.email, &order).await;

        if let Some(publisher) = &self.publisher {
            publisher.publish(ctx, &order).await;
        }

        advance(&mut state, SagaState::Done);
        Ok(order)
    }
}

fn advance(state: &mut SagaState, next: SagaState) {
    debug_assert!(
        state.can_transition_to(next),
        "invalid saga transition {state} -> {next}"
    );
    debug!(from = %state, to = %next, "saga state transition");
    *state = next;
}

impl std::fmt::Debug for CheckoutSaga {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutSaga")
            .field("publishes_events", &self.publishes_events())
            .finish_non_exhaustive()
    }
}
