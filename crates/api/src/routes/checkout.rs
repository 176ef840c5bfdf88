//! Order placement endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use common::{RequestContext, TraceContext, is_valid_currency_code};
use domain::OrderResult;
use saga::{CheckoutSaga, PlaceOrderRequest};
use serde::Serialize;

use crate::error::ApiError;

/// Per-request deadline override, in milliseconds.
pub const REQUEST_TIMEOUT_HEADER: &str = "x-request-timeout-ms";

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub saga: CheckoutSaga,
    pub request_timeout: Duration,
}

#[derive(Debug, Serialize)]
pub struct PlaceOrderResponse {
    pub order: OrderResult,
}

/// POST /place_order: runs the placement saga for the caller's cart.
#[tracing::instrument(skip_all)]
pub async fn place_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<Json<PlaceOrderResponse>, ApiError> {
    let Json(req) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    validate(&req)?;

    let trace = TraceContext::extract_or_root(|name| {
        headers.get(name).and_then(|value| value.to_str().ok())
    });
    let timeout = request_timeout(&headers, state.request_timeout);
    let ctx = RequestContext::background()
        .with_trace(trace)
        .with_timeout(timeout);

    let order = state.saga.place_order(&ctx, &req).await?;
    Ok(Json(PlaceOrderResponse { order }))
}

fn validate(req: &PlaceOrderRequest) -> Result<(), ApiError> {
    if req.user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("user_id must not be empty".to_string()));
    }
    if !is_valid_currency_code(&req.user_currency) {
        return Err(ApiError::BadRequest(format!(
            "invalid user_currency {:?}",
            req.user_currency
        )));
    }
    Ok(())
}

/// The smaller of the configured timeout and a valid header override.
fn request_timeout(headers: &HeaderMap, configured: Duration) -> Duration {
    headers
        .get(REQUEST_TIMEOUT_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
        .map_or(configured, |requested| requested.min(configured))
}
