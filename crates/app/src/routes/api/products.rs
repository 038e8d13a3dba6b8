//! Per-product spin swipe settings for the product admin panels.

use axum::{
    Json, Router,
    extract::{Path, rejection::JsonRejection},
    routing::get,
};
use spin_swipe_core::GlobalId;
use tracing::instrument;

use super::spinning_selection::SuccessResponse;
use crate::error::AppError;
use crate::middleware::ShopContext;
use crate::shopify::{SpinSwipeSettings, SpinSwipeUpdate};
use crate::state::AppState;

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/products/{id}/spin-swipe",
        get(get_spin_swipe).post(set_spin_swipe),
    )
}

fn product_id(raw: &str) -> Result<GlobalId, AppError> {
    GlobalId::product(raw).map_err(|e| AppError::BadRequest(format!("Invalid product id: {e}")))
}

/// GET /api/products/{id}/spin-swipe - Read a product's settings.
///
/// # Errors
///
/// Returns 401 without a resolvable shop session, 400 for a bad id, 404 for
/// an unknown product.
#[instrument(skip(ctx), fields(shop = %ctx.shop))]
pub async fn get_spin_swipe(
    ctx: ShopContext,
    Path(id): Path<String>,
) -> Result<Json<SpinSwipeSettings>, AppError> {
    let product_id = product_id(&id)?;
    Ok(Json(ctx.admin.get_spin_swipe(&product_id).await?))
}

/// POST /api/products/{id}/spin-swipe - Update a product's settings.
///
/// # Errors
///
/// Returns 401 without a resolvable shop session, 400 for a bad id, an empty
/// update or a refused write.
#[instrument(skip(ctx, body), fields(shop = %ctx.shop))]
pub async fn set_spin_swipe(
    ctx: ShopContext,
    Path(id): Path<String>,
    body: Result<Json<SpinSwipeUpdate>, JsonRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let product_id = product_id(&id)?;
    let Json(update) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    if update.is_empty() {
        return Err(AppError::BadRequest(
            "Provide at least one of enabled, text".to_string(),
        ));
    }

    let confirmation = ctx.admin.set_spin_swipe(&product_id, &update).await?;
    if confirmation.has_user_errors() {
        let messages: Vec<_> = confirmation
            .user_errors
            .iter()
            .map(|e| e.message.as_str())
            .collect();
        return Err(AppError::BadRequest(messages.join("; ")));
    }

    Ok(Json(SuccessResponse { success: true }))
}
