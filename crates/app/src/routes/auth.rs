//! OAuth install flow.
//!
//! `/auth` starts the authorization-code grant for a shop; `/auth/callback`
//! finishes it, stores the offline session and provisions the shop.

use axum::{
    Router,
    extract::{Query, RawQuery, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use spin_swipe_core::ShopDomain;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::ShopSession;
use crate::error::AppError;
use crate::routes::query_pairs;
use crate::shopify::AdminClient;
use crate::shopify::hmac::verify_query_hmac;
use crate::state::AppState;
use crate::webhooks::{Topic, provision_definitions};

const OAUTH_STATE_KEY: &str = "shopify_oauth_state";

/// Build the OAuth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth", get(begin))
        .route("/auth/callback", get(callback))
}

#[derive(Debug, Deserialize)]
pub struct BeginParams {
    pub shop: Option<String>,
}

fn accepted_shop(state: &AppState, raw: Option<&str>) -> Result<ShopDomain, AppError> {
    let raw = raw
        .filter(|s| !s.trim().is_empty())
        .ok_or(AppError::MissingParameter("Shop parameter is required"))?;

    ShopDomain::parse(raw)
        .ok()
        .filter(|shop| state.shopify().config().accepts_shop(shop))
        .ok_or(AppError::MissingParameter("Invalid shop parameter"))
}

/// GET /auth?shop= - Redirect to the shop's OAuth consent screen.
///
/// # Errors
///
/// Returns 400 for a missing or unaccepted shop, 500 if the state can't be
/// stored.
#[instrument(skip(state, session))]
pub async fn begin(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<BeginParams>,
) -> Result<Response, AppError> {
    let shop = accepted_shop(&state, params.shop.as_deref())?;

    // Random state parameter for CSRF protection
    let oauth_state = uuid::Uuid::new_v4().to_string();
    session
        .insert(OAUTH_STATE_KEY, &oauth_state)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to store OAuth state: {e}")))?;

    let redirect_uri = state.config().app_path("/auth/callback");
    let auth_url = state
        .shopify()
        .authorization_url(&shop, &redirect_uri, &oauth_state);

    tracing::info!(shop = %shop, "Redirecting to Shopify OAuth");
    Ok(Redirect::to(&auth_url).into_response())
}

/// Subscribe the shop to every topic the app handles.
///
/// Failures are logged; a missing subscription only delays cleanup.
async fn register_webhooks(state: &AppState, admin: &AdminClient) {
    let callback_url = state.config().app_path("/webhooks");

    for topic in Topic::SUBSCRIBED {
        match admin.register_webhook(topic.graphql_name(), &callback_url).await {
            Ok(outcome) if outcome.is_active() => {
                tracing::info!(shop = %admin.shop(), %topic, ?outcome, "Webhook subscription in place");
            }
            Ok(outcome) => {
                tracing::error!(shop = %admin.shop(), %topic, ?outcome, "Webhook subscription refused");
            }
            Err(e) => {
                tracing::error!(shop = %admin.shop(), %topic, error = %e, "Webhook registration failed");
            }
        }
    }
}

/// GET /auth/callback - Finish OAuth and provision the shop.
///
/// # Errors
///
/// Returns 401 for a bad HMAC, 400 for a missing code or a state mismatch,
/// 500 if the code exchange or session storage fails.
#[instrument(skip(state, session, query))]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let params = query_pairs(query.as_deref());
    let param = |name: &str| {
        params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    };

    if !verify_query_hmac(&params, state.shopify().api_secret()) {
        tracing::warn!("Invalid HMAC signature in OAuth callback");
        return Err(AppError::InvalidSignature);
    }

    let shop = accepted_shop(&state, param("shop"))?;
    let code = param("code").ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;
    let callback_state = param("state").ok_or_else(|| AppError::BadRequest("Missing OAuth state".to_string()))?;

    // Verify state matches what we stored
    let stored_state: Option<String> = session.get(OAUTH_STATE_KEY).await.ok().flatten();
    if stored_state.as_deref() != Some(callback_state) {
        tracing::warn!(shop = %shop, "OAuth state mismatch");
        return Err(AppError::BadRequest("Invalid OAuth state".to_string()));
    }
    if let Err(e) = session.remove::<String>(OAUTH_STATE_KEY).await {
        tracing::warn!(shop = %shop, error = %e, "Failed to clear OAuth state");
    }

    let token = state
        .shopify()
        .exchange_code(&shop, code)
        .await
        .map_err(|e| AppError::upstream("OAuth exchange failed", e))?;

    let shop_session = ShopSession::from(token);
    state.sessions().store(&shop_session).await?;
    tracing::info!(shop = %shop, "Offline session stored");

    let admin = state.shopify().admin_client(&shop_session);
    register_webhooks(&state, &admin).await;

    if let Err(e) = provision_definitions(&admin).await {
        tracing::error!(shop = %shop, error = %e, "Install provisioning incomplete");
    }

    let mut target = format!("/app?shop={}", urlencoding::encode(shop.as_str()));
    if let Some(host) = param("host") {
        target.push_str(&format!("&host={}", urlencoding::encode(host)));
    }
    Ok(Redirect::to(&target).into_response())
}
