//! Spinning selection API for the embedded admin.

use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::ShopContext;
use crate::state::AppState;

/// Build the spinning selection router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/spinning-selection",
        get(get_selection).post(set_selection),
    )
}

/// Response carrying the current selection.
#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    /// Stored document, or `null` when unset or unreadable.
    pub selection: Value,
}

/// Request for replacing the selection.
#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    /// New document; absent means `null`.
    #[serde(default)]
    pub selection: Value,
}

/// Response for a write.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// GET /api/spinning-selection - Read the shop's selection.
///
/// # Errors
///
/// Returns 401 without a resolvable shop session, 500 if the read fails.
#[instrument(skip(ctx), fields(shop = %ctx.shop))]
pub async fn get_selection(ctx: ShopContext) -> Result<Json<SelectionResponse>, AppError> {
    let selection = ctx.admin.get_spinning_selection().await?;
    Ok(Json(SelectionResponse {
        selection: selection.unwrap_or(Value::Null),
    }))
}

/// POST /api/spinning-selection - Replace the shop's selection.
///
/// User errors reported by the store are logged by the gateway and do not
/// fail the request.
///
/// # Errors
///
/// Returns 401 without a resolvable shop session, 400 for a malformed body,
/// 500 if the owner id cannot be resolved or a call fails.
#[instrument(skip(ctx, body), fields(shop = %ctx.shop))]
pub async fn set_selection(
    ctx: ShopContext,
    body: Result<Json<SelectionRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    ctx.admin.set_spinning_selection(&body.selection).await?;
    tracing::info!("Spinning selection updated");

    Ok(Json(SuccessResponse { success: true }))
}
