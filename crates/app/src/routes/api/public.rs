//! Public storefront settings. No authentication.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use spin_swipe_core::ShopDomain;
use tracing::instrument;

use crate::error::AppError;
use crate::services::menu::{self, fetch_public_settings};
use crate::state::AppState;

/// Build the public settings router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/public/settings", get(public_settings))
}

#[derive(Debug, Deserialize)]
pub struct PublicSettingsParams {
    pub shop: Option<String>,
}

/// GET /api/public/settings?shop= - Read the shop's public menu.
///
/// `shop` must be a bare host name so the request can't be pointed at an
/// arbitrary URL, port or path.
#[instrument(skip(state))]
pub async fn public_settings(
    State(state): State<AppState>,
    Query(params): Query<PublicSettingsParams>,
) -> Response {
    let Some(raw_shop) = params.shop.filter(|s| !s.trim().is_empty()) else {
        return AppError::MissingParameter("Shop parameter is required").into_response();
    };

    let Ok(shop) = ShopDomain::parse(&raw_shop) else {
        return AppError::MissingParameter("Invalid shop parameter").into_response();
    };

    let origin = state.shopify().shop_origin(&shop);
    match fetch_public_settings(state.http(), &origin, shop.clone()).await {
        Ok(settings) => Json(settings).into_response(),
        Err(e) => {
            tracing::error!(shop = %shop, error = %e, "Error fetching public settings");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to fetch settings",
                    "shop": shop,
                    "timestamp": menu::timestamp_now(),
                })),
            )
                .into_response()
        }
    }
}
