//! HTTP implementations of the saga's collaborator traits.

use async_trait::async_trait;
use common::{Money, RequestContext};
use domain::{Address, CartItem, CreditCardInfo, OrderResult, Product, ProductId};
use saga::{
    CartService, CurrencyService, EmailService, PaymentService, ProductCatalogService,
    ServiceError, ShippingService,
};
use serde::{Deserialize, Serialize};

use super::http::JsonClient;

/// Base URL charged while the payment fault-injection flag is on.
pub const UNREACHABLE_PAYMENT_ADDR: &str = "http://badAddress:50051";

#[derive(Deserialize)]
struct CartResponse {
    #[serde(default)]
    items: Vec<CartItem>,
}

#[derive(Serialize)]
struct ConvertRequest<'a> {
    from: &'a Money,
    to_code: &'a str,
}

#[derive(Serialize)]
struct ShippingRequest<'a> {
    address: &'a Address,
    items: &'a [CartItem],
}

#[derive(Deserialize)]
struct QuoteResponse {
    cost_usd: Money,
}

#[derive(Deserialize)]
struct ShipOrderResponse {
    tracking_id: String,
}

#[derive(Serialize)]
struct ChargeRequest<'a> {
    amount: &'a Money,
    credit_card: &'a CreditCardInfo,
}

#[derive(Deserialize)]
struct ChargeResponse {
    transaction_id: String,
}

#[derive(Serialize)]
struct OrderConfirmation<'a> {
    email: &'a str,
    order: &'a OrderResult,
}

/// Cart service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCartService(pub JsonClient);

#[async_trait]
impl CartService for HttpCartService {
    async fn get_cart(
        &self,
        ctx: &RequestContext,
        user_id: &str,
    ) -> Result<Vec<CartItem>, ServiceError> {
        let cart: CartResponse = self.0.get_json(ctx, &["carts", user_id]).await?;
        Ok(cart.items)
    }

    async fn empty_cart(&self, ctx: &RequestContext, user_id: &str) -> Result<(), ServiceError> {
        self.0.delete(ctx, &["carts", user_id]).await
    }
}

/// Product catalog over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCatalogService(pub JsonClient);

#[async_trait]
impl ProductCatalogService for HttpCatalogService {
    async fn get_product(
        &self,
        ctx: &RequestContext,
        id: &ProductId,
    ) -> Result<Product, ServiceError> {
        self.0.get_json(ctx, &["products", id.as_str()]).await
    }
}

/// Currency service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCurrencyService(pub JsonClient);

#[async_trait]
impl CurrencyService for HttpCurrencyService {
    async fn convert(
        &self,
        ctx: &RequestContext,
        from: &Money,
        to_code: &str,
    ) -> Result<Money, ServiceError> {
        self.0
            .post_json(ctx, &["convert"], &ConvertRequest { from, to_code })
            .await
    }
}

/// Shipping service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpShippingService(pub JsonClient);

#[async_trait]
impl ShippingService for HttpShippingService {
    async fn get_quote(
        &self,
        ctx: &RequestContext,
        address: &Address,
        items: &[CartItem],
    ) -> Result<Money, ServiceError> {
        let quote: QuoteResponse = self
            .0
            .post_json(ctx, &["get_quote"], &ShippingRequest { address, items })
            .await?;
        Ok(quote.cost_usd)
    }

    async fn ship_order(
        &self,
        ctx: &RequestContext,
        address: &Address,
        items: &[CartItem],
    ) -> Result<String, ServiceError> {
        let shipped: ShipOrderResponse = self
            .0
            .post_json(ctx, &["ship_order"], &ShippingRequest { address, items })
            .await?;
        Ok(shipped.tracking_id)
    }
}

/// Payment service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPaymentService(pub JsonClient);

#[async_trait]
impl PaymentService for HttpPaymentService {
    async fn charge(
        &self,
        ctx: &RequestContext,
        amount: &Money,
        card: &CreditCardInfo,
    ) -> Result<String, ServiceError> {
        let charged: ChargeResponse = self
            .0
            .post_json(
                ctx,
                &["charge"],
                &ChargeRequest {
                    amount,
                    credit_card: card,
                },
            )
            .await?;
        Ok(charged.transaction_id)
    }
}

/// Email service over HTTP. Any non-2xx response is a failure.
#[derive(Debug, Clone)]
pub struct HttpEmailService(pub JsonClient);

#[async_trait]
impl EmailService for HttpEmailService {
    async fn send_order_confirmation(
        &self,
        ctx: &RequestContext,
        email: &str,
        order: &OrderResult,
    ) -> Result<(), ServiceError> {
        self.0
            .post(
                ctx,
                &["send_order_confirmation"],
                &OrderConfirmation { email, order },
            )
            .await
    }
}
