//! App proxy routes, reached through the storefront at `/apps/...`.
//!
//! The platform signs every proxied request. A request without a usable
//! `shop` is refused first; the signature is checked next, before the
//! shop's session is looked up.

use axum::{
    Json, Router,
    extract::{RawQuery, State},
    routing::get,
};
use spin_swipe_core::ShopDomain;
use tracing::instrument;

use crate::error::AppError;
use crate::routes::api::spinning_selection::SelectionResponse;
use crate::routes::query_pairs;
use crate::shopify::hmac::verify_proxy_signature;
use crate::state::AppState;

const FETCH_FAILED: &str = "Failed to fetch selection";

/// Build the app proxy router.
pub fn router() -> Router<AppState> {
    Router::new().route("/apps/spinning-tool-selection", get(spinning_tool_selection))
}

/// GET /apps/spinning-tool-selection?shop= - Storefront read of the selection.
///
/// # Errors
///
/// Returns 400 without a usable `shop`, 401 on a bad signature, 500 if the
/// shop has no offline session or the read fails.
#[instrument(skip(state, query))]
pub async fn spinning_tool_selection(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<SelectionResponse>, AppError> {
    let params = query_pairs(query.as_deref());

    let shop = params
        .iter()
        .find(|(k, _)| k == "shop")
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.is_empty())
        .ok_or(AppError::MissingParameter("Missing shop param"))?;

    if !verify_proxy_signature(&params, state.shopify().api_secret()) {
        tracing::warn!(shop, "App proxy signature mismatch");
        return Err(AppError::InvalidSignature);
    }

    let shop = ShopDomain::parse(shop).map_err(|_| AppError::MissingParameter("Missing shop param"))?;

    let session = state
        .sessions()
        .load_offline(&shop)
        .await
        .map_err(|e| AppError::upstream(FETCH_FAILED, e))?
        .ok_or_else(|| AppError::upstream(FETCH_FAILED, format!("no offline session for {shop}")))?;

    let selection = state
        .shopify()
        .admin_client(&session)
        .get_spinning_selection()
        .await
        .map_err(|e| AppError::upstream(FETCH_FAILED, e))?;

    Ok(Json(SelectionResponse {
        selection: selection.unwrap_or_default(),
    }))
}
