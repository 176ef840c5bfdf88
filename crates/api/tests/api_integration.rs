//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use api::AppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{FeatureFlags, Money};
use domain::{CartItem, Product, ProductId};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{
    CheckoutMetrics, CheckoutSaga, CheckoutServices, InMemoryCartService, InMemoryCatalogService,
    InMemoryCurrencyService, InMemoryEmailService, InMemoryPaymentService,
    InMemoryShippingService,
};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

/// In-memory collaborators behind a real router.
struct TestApp {
    cart: InMemoryCartService,
    shipping: InMemoryShippingService,
    payment: InMemoryPaymentService,
}

impl TestApp {
    fn new() -> Self {
        Self {
            cart: InMemoryCartService::new(),
            shipping: InMemoryShippingService::new(Money::from_cents("USD", 500).unwrap()),
            payment: InMemoryPaymentService::new(),
        }
    }

    fn router(&self) -> axum::Router {
        let metrics_handle = get_metrics_handle();

        let catalog = InMemoryCatalogService::new();
        catalog.add_product(Product {
            id: ProductId::new("OLJCESPC7Z"),
            name: "Sunglasses".to_string(),
            price_usd: Money::from_cents("USD", 1999).unwrap(),
        });
        self.cart
            .set_cart("user-1", vec![CartItem::new("OLJCESPC7Z", 1)]);

        let services = CheckoutServices {
            cart: Arc::new(self.cart.clone()),
            catalog: Arc::new(catalog),
            currency: Arc::new(InMemoryCurrencyService::new()),
            shipping: Arc::new(self.shipping.clone()),
            payment: Arc::new(self.payment.clone()),
            unreachable_payment: Arc::new(InMemoryPaymentService::new()),
            email: Arc::new(InMemoryEmailService::new()),
        };
        let saga = CheckoutSaga::new(
            services,
            FeatureFlags::disabled(),
            CheckoutMetrics::register(),
        );
        let state = Arc::new(AppState {
            saga,
            request_timeout: Duration::from_secs(5),
        });
        api::create_app(state, metrics_handle)
    }
}

fn order_request(user_id: &str, currency: &str) -> serde_json::Value {
    serde_json::json!({
        "user_id": user_id,
        "user_currency": currency,
        "address": {
            "street_address": "1600 Amphitheatre Parkway",
            "city": "Mountain View",
            "state": "CA",
            "country": "United States",
            "zip_code": 94043
        },
        "email": "someone@example.com",
        "credit_card": {
            "credit_card_number": "4432-8015-6152-0454",
            "credit_card_cvv": 672,
            "credit_card_expiration_year": 2039,
            "credit_card_expiration_month": 1
        }
    })
}

fn post_order(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/place_order")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["status"], "SERVING");
}

#[tokio::test]
async fn test_place_order() {
    let test_app = TestApp::new();
    let app = test_app.router();

    let response = app
        .oneshot(post_order(order_request("user-1", "USD").to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    let order = &json["order"];
    assert_eq!(order["shipping_tracking_id"], "TRACK-0001");
    assert_eq!(order["shipping_cost"]["currency_code"], "USD");
    assert_eq!(order["shipping_cost"]["units"], 5);
    assert_eq!(order["shipping_address"]["city"], "Mountain View");
    assert_eq!(order["items"].as_array().unwrap().len(), 1);
    assert_eq!(order["items"][0]["item"]["product_id"], "OLJCESPC7Z");
    assert_eq!(order["items"][0]["cost"]["units"], 19);
    assert_eq!(order["items"][0]["cost"]["nanos"], 990_000_000);
    assert!(order["order_id"].as_str().is_some_and(|id| !id.is_empty()));

    assert_eq!(test_app.payment.charge_count(), 1);
    assert!(test_app.cart.cart("user-1").is_empty());
}

#[tokio::test]
async fn test_place_order_rejects_invalid_input() {
    let test_app = TestApp::new();

    for body in [
        order_request("user-1", "DOLLARS").to_string(),
        order_request("", "USD").to_string(),
        "{\"user_id\": \"user-1\"".to_string(),
        "{\"user_id\": \"user-1\"}".to_string(),
    ] {
        let response = test_app.router().oneshot(post_order(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = read_json(response).await;
        assert!(json["error"].is_string());
    }

    assert_eq!(test_app.cart.get_count(), 0);
    assert_eq!(test_app.payment.attempt_count(), 0);
}

#[tokio::test]
async fn test_place_order_payment_failure() {
    let test_app = TestApp::new();
    test_app.payment.set_fail_on_charge(true);

    let response = test_app
        .router()
        .oneshot(post_order(order_request("user-1", "USD").to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = read_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("failed to charge card"));
    assert_eq!(test_app.shipping.ship_count(), 0);
}

#[tokio::test]
async fn test_place_order_shipping_failure_after_payment() {
    let test_app = TestApp::new();
    test_app.shipping.set_fail_on_ship(true);

    let response = test_app
        .router()
        .oneshot(post_order(order_request("user-1", "USD").to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(test_app.payment.charge_count(), 1);
    assert_eq!(test_app.cart.empty_count(), 0);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let test_app = TestApp::new();

    let response = test_app
        .router()
        .oneshot(post_order(order_request("user-1", "USD").to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = test_app
        .router()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("checkout_place_order_total"));
    assert!(text.contains("checkout_place_order_duration_seconds"));
}
