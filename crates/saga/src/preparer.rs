//! Gathers cart contents, localized prices and the shipping quote.

use std::sync::Arc;

use common::RequestContext;
use domain::{Address, CartItem, OrderItem, OrderPreparation};
use tracing::debug;

use crate::error::{CheckoutError, Result, ServiceError};
use crate::services::{CartService, CurrencyService, ProductCatalogService, ShippingService};

/// Read-only preparation step of the checkout saga.
///
/// Any collaborator failure aborts the whole preparation; no partial
/// order items are returned.
#[derive(Clone)]
pub struct OrderPreparer {
    cart: Arc<dyn CartService>,
    catalog: Arc<dyn ProductCatalogService>,
    currency: Arc<dyn CurrencyService>,
    shipping: Arc<dyn ShippingService>,
}

impl OrderPreparer {
    pub fn new(
        cart: Arc<dyn CartService>,
        catalog: Arc<dyn ProductCatalogService>,
        currency: Arc<dyn CurrencyService>,
        shipping: Arc<dyn ShippingService>,
    ) -> Self {
        Self {
            cart,
            catalog,
            currency,
            shipping,
        }
    }

    #[tracing::instrument(skip(self, ctx, address), fields(app.user.id = %user_id, app.user.currency = %user_currency))]
    pub async fn prepare(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        user_currency: &str,
        address: &Address,
    ) -> Result<OrderPreparation> {
        let cart_items = ctx
            .run(self.cart.get_cart(ctx, user_id))
            .await
            .map_err(CheckoutError::CartUnavailable)?;
        if let Some(item) = cart_items.iter().find(|item| !item.has_valid_quantity()) {
            return Err(CheckoutError::CartUnavailable(ServiceError::InvalidResponse(
                format!("product {} has quantity {}", item.product_id, item.quantity),
            )));
        }

        let order_items = self.price_items(ctx, &cart_items, user_currency).await?;

        let quote = ctx
            .run(self.shipping.get_quote(ctx, address, &cart_items))
            .await
            .map_err(CheckoutError::ShippingUnavailable)?;
        let shipping_cost = ctx
            .run(self.currency.convert(ctx, &quote, user_currency))
            .await
            .map_err(CheckoutError::ShippingUnavailable)?;

        debug!(
            items = order_items.len(),
            shipping_cost = %shipping_cost,
            "order prepared"
        );
        Ok(OrderPreparation {
            order_items,
            cart_items,
            shipping_cost,
        })
    }

    async fn price_items(
        &self,
        ctx: &RequestContext,
        items: &[CartItem],
        user_currency: &str,
    ) -> Result<Vec<OrderItem>> {
        let mut order_items = Vec::with_capacity(items.len());
        for item in items {
            let pricing_failed = |source: ServiceError| CheckoutError::PricingUnavailable {
                product_id: item.product_id.clone(),
                source,
            };
            let product = ctx
                .run(self.catalog.get_product(ctx, &item.product_id))
                .await
                .map_err(pricing_failed)?;
            let cost = ctx
                .run(self.currency.convert(ctx, &product.price_usd, user_currency))
                .await
                .map_err(pricing_failed)?;
            order_items.push(OrderItem::new(item.clone(), cost));
        }
        Ok(order_items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Money, TraceContext};
    use domain::{Product, ProductId};

    use crate::services::{
        InMemoryCartService, InMemoryCatalogService, InMemoryCurrencyService,
        InMemoryShippingService,
    };

    struct Fixture {
        cart: InMemoryCartService,
        catalog: InMemoryCatalogService,
        currency: InMemoryCurrencyService,
        shipping: InMemoryShippingService,
        preparer: OrderPreparer,
    }

    fn fixture() -> Fixture {
        let cart = InMemoryCartService::new();
        let catalog = InMemoryCatalogService::new();
        let currency = InMemoryCurrencyService::new();
        currency.set_rate("EUR", 500_000_000);
        let shipping = InMemoryShippingService::new(Money::from_cents("USD", 1000).unwrap());

        cart.set_cart(
            "user-1",
            vec![CartItem::new("A", 2), CartItem::new("B", 1)],
        );
        for (id, cents) in [("A", 2000), ("B", 400)] {
            catalog.add_product(Product {
                id: ProductId::new(id),
                name: id.to_string(),
                price_usd: Money::from_cents("USD", cents).unwrap(),
            });
        }

        let preparer = OrderPreparer::new(
            Arc::new(cart.clone()),
            Arc::new(catalog.clone()),
            Arc::new(currency.clone()),
            Arc::new(shipping.clone()),
        );
        Fixture {
            cart,
            catalog,
            currency,
            shipping,
            preparer,
        }
    }

    #[tokio::test]
    async fn test_prices_and_shipping_are_localized() {
        let f = fixture();
        let prep = f
            .preparer
            .prepare(&RequestContext::background(), "user-1", "EUR", &Address::default())
            .await
            .unwrap();

        assert_eq!(prep.cart_items.len(), 2);
        assert_eq!(prep.order_items[0].cost, Money::from_cents("EUR", 1000).unwrap());
        assert_eq!(prep.order_items[1].cost, Money::from_cents("EUR", 200).unwrap());
        assert_eq!(prep.shipping_cost, Money::from_cents("EUR", 500).unwrap());
        assert_eq!(
            prep.total("EUR").unwrap(),
            Money::from_cents("EUR", 2 * 1000 + 200 + 500).unwrap()
        );
    }

    #[tokio::test]
    async fn test_cart_failure_stops_before_pricing() {
        let f = fixture();
        f.cart.set_fail_on_get(true);

        let err = f
            .preparer
            .prepare(&RequestContext::background(), "user-1", "USD", &Address::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::CartUnavailable(_)));
        assert_eq!(f.catalog.lookup_count(), 0);
        assert_eq!(f.shipping.quote_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_quantity_line_rejects_cart() {
        let f = fixture();
        f.cart.set_cart(
            "user-1",
            vec![CartItem::new("A", 1), CartItem::new("B", 0)],
        );

        let err = f
            .preparer
            .prepare(&RequestContext::background(), "user-1", "USD", &Address::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::CartUnavailable(ServiceError::InvalidResponse(_))
        ));
        assert_eq!(f.catalog.lookup_count(), 0);
        assert_eq!(f.shipping.quote_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_product_aborts_whole_preparation() {
        let f = fixture();
        f.cart.set_cart(
            "user-1",
            vec![CartItem::new("A", 1), CartItem::new("GONE", 1)],
        );

        let err = f
            .preparer
            .prepare(&RequestContext::background(), "user-1", "USD", &Address::default())
            .await
            .unwrap_err();

        match err {
            CheckoutError::PricingUnavailable { product_id, .. } => {
                assert_eq!(product_id, ProductId::new("GONE"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(f.shipping.quote_count(), 0);
    }

    #[tokio::test]
    async fn test_conversion_failure_is_pricing_error() {
        let f = fixture();
        f.currency.set_fail_on_convert(true);

        let err = f
            .preparer
            .prepare(&RequestContext::background(), "user-1", "EUR", &Address::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::PricingUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_quote_failure_is_shipping_unavailable() {
        let f = fixture();
        f.shipping.set_fail_on_quote(true);

        let err = f
            .preparer
            .prepare(&RequestContext::background(), "user-1", "USD", &Address::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::ShippingUnavailable(_)));
    }

    #[tokio::test]
    async fn test_cancelled_context_fails_fast() {
        let f = fixture();
        let (ctx, handle) = RequestContext::with_cancel(TraceContext::root());
        handle.cancel();

        let err = f
            .preparer
            .prepare(&ctx, "user-1", "USD", &Address::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::CartUnavailable(ServiceError::Context(_))
        ));
        assert_eq!(f.cart.get_count(), 0);
    }
}
