//! HTTP front end for the checkout service.
//!
//! Exposes order placement, a health check and Prometheus metrics, and
//! wires the placement saga to its collaborators over HTTP. Order events
//! go to Kafka when a broker is configured.

pub mod clients;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use common::FeatureFlags;
use event_publisher::{EventPublisher, KafkaProducer, PublisherMetrics};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{CheckoutMetrics, CheckoutSaga, CheckoutServices};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use clients::{
    FlagdProvider, HttpCartService, HttpCatalogService, HttpCurrencyService, HttpEmailService,
    HttpPaymentService, HttpShippingService, JsonClient, UNREACHABLE_PAYMENT_ADDR,
};
use config::Config;
use error::StartupError;
pub use routes::checkout::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/place_order", post(routes::checkout::place_order))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Builds the application state from configuration.
///
/// Returns the Kafka producer alongside the state so the caller can flush
/// it on shutdown. No producer is created when no broker is configured.
pub fn create_state(
    config: &Config,
) -> Result<(Arc<AppState>, Option<Arc<KafkaProducer>>), StartupError> {
    let http = reqwest::Client::builder().build()?;
    let client = |base_url: &str| JsonClient::new(http.clone(), base_url);

    let services = CheckoutServices {
        cart: Arc::new(HttpCartService(client(&config.cart_addr))),
        catalog: Arc::new(HttpCatalogService(client(&config.catalog_addr))),
        currency: Arc::new(HttpCurrencyService(client(&config.currency_addr))),
        shipping: Arc::new(HttpShippingService(client(&config.shipping_addr))),
        payment: Arc::new(HttpPaymentService(client(&config.payment_addr))),
        unreachable_payment: Arc::new(HttpPaymentService(client(UNREACHABLE_PAYMENT_ADDR))),
        email: Arc::new(HttpEmailService(client(&config.email_addr))),
    };

    let flags = match &config.flagd_addr {
        Some(addr) => {
            info!(flagd = %addr, "evaluating feature flags via flagd");
            FeatureFlags::new(Arc::new(FlagdProvider::new(client(addr))))
        }
        None => {
            info!("no flag backend configured, all flags use their defaults");
            FeatureFlags::disabled()
        }
    };

    let mut saga = CheckoutSaga::new(services, flags.clone(), CheckoutMetrics::register());

    let producer = match &config.kafka_addr {
        Some(brokers) => {
            let producer = Arc::new(KafkaProducer::connect(brokers)?);
            let publisher = EventPublisher::new(
                producer.clone(),
                config.kafka_topic.clone(),
                flags,
                PublisherMetrics::register(),
            );
            saga = saga.with_publisher(publisher);
            Some(producer)
        }
        None => {
            info!("KAFKA_SERVICE_ADDR not set, order events will not be published");
            None
        }
    };

    let state = Arc::new(AppState {
        saga,
        request_timeout: config.request_timeout,
    });
    Ok((state, producer))
}
