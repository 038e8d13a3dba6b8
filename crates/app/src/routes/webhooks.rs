//! Webhook delivery endpoint.

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::Value;
use spin_swipe_core::ShopDomain;
use tracing::instrument;

use crate::error::AppError;
use crate::shopify::hmac::verify_webhook_hmac;
use crate::state::AppState;
use crate::webhooks::{Dispatch, Topic, WebhookContext};

pub const HMAC_HEADER: &str = "x-shopify-hmac-sha256";
pub const TOPIC_HEADER: &str = "x-shopify-topic";
pub const SHOP_HEADER: &str = "x-shopify-shop-domain";
pub const WEBHOOK_ID_HEADER: &str = "x-shopify-webhook-id";
pub const API_VERSION_HEADER: &str = "x-shopify-api-version";

/// Build the webhook router.
pub fn router() -> Router<AppState> {
    Router::new().route("/webhooks", post(receive))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// POST /webhooks - Receive a webhook delivery.
///
/// Once the delivery is authenticated the response is always 200: handler
/// failures are logged, never surfaced to the platform.
#[instrument(skip_all, fields(topic = tracing::field::Empty, shop = tracing::field::Empty))]
pub async fn receive(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let signature = header(&headers, HMAC_HEADER).unwrap_or_default();
    if !verify_webhook_hmac(&body, signature, state.shopify().api_secret()) {
        tracing::warn!("Webhook HMAC verification failed");
        return AppError::InvalidSignature.into_response();
    }

    let (Some(raw_topic), Some(raw_shop)) = (header(&headers, TOPIC_HEADER), header(&headers, SHOP_HEADER)) else {
        return AppError::BadRequest("Missing webhook topic or shop header".to_string()).into_response();
    };

    tracing::Span::current().record("topic", raw_topic).record("shop", raw_shop);

    let Ok(shop) = ShopDomain::parse(raw_shop) else {
        return AppError::BadRequest(format!("Invalid shop header: {raw_shop}")).into_response();
    };

    let Some(topic) = Topic::from_header(raw_topic) else {
        tracing::warn!("Unhandled webhook topic");
        return StatusCode::OK.into_response();
    };

    let admin = match state.sessions().load_offline(&shop).await {
        Ok(session) => session.map(|s| state.shopify().admin_client(&s)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load session for webhook");
            None
        }
    };

    let ctx = WebhookContext {
        topic,
        shop,
        payload: serde_json::from_slice(&body).unwrap_or(Value::Null),
        webhook_id: header(&headers, WEBHOOK_ID_HEADER).map(String::from),
        api_version: header(&headers, API_VERSION_HEADER).map(String::from),
        admin,
    };

    match state.webhooks().dispatch(&ctx).await {
        Ok(Dispatch::Handled) => tracing::info!(webhook_id = ?ctx.webhook_id, "Webhook handled"),
        Ok(Dispatch::Unhandled) => tracing::warn!("No handler registered for webhook topic"),
        Err(e) => tracing::error!(error = %e, webhook_id = ?ctx.webhook_id, "Webhook handler failed"),
    }

    StatusCode::OK.into_response()
}
