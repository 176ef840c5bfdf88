//! Shipment dispatch and the post-order cart reset.

use std::sync::Arc;

use common::RequestContext;
use domain::{Address, CartItem};
use tracing::{info, warn};

use crate::error::{CheckoutError, Result};
use crate::services::{CartService, ShippingService};

#[derive(Clone)]
pub struct FulfillmentDispatcher {
    shipping: Arc<dyn ShippingService>,
    cart: Arc<dyn CartService>,
}

impl FulfillmentDispatcher {
    pub fn new(shipping: Arc<dyn ShippingService>, cart: Arc<dyn CartService>) -> Self {
        Self { shipping, cart }
    }

    /// Ships `items` to `address`, returning the tracking ID.
    #[tracing::instrument(skip_all, fields(items = items.len()))]
    pub async fn ship(
        &self,
        ctx: &RequestContext,
        address: &Address,
        items: &[CartItem],
    ) -> Result<String> {
        let tracking_id = ctx
            .run(self.shipping.ship_order(ctx, address, items))
            .await
            .map_err(CheckoutError::ShippingFailed)?;

        info!(app.shipping.tracking.id = %tracking_id, "order shipped");
        Ok(tracking_id)
    }

    /// Empties the user's cart. Failures are logged and dropped.
    pub async fn reset_cart(&self, ctx: &RequestContext, user_id: &str) {
        if let Err(err) = ctx.run(self.cart.empty_cart(ctx, user_id)).await {
            warn!(app.user.id = %user_id, error = %err, "failed to empty user cart during checkout");
        }
    }
}
