//! Session resolution for embedded admin API calls.
//!
//! The embedded frontend sends a session token with every request, either as
//! `Authorization: Bearer <token>` or as an `id_token` query parameter. The
//! token names the shop; the shop's offline session supplies the Admin API
//! credential. A shop without an offline session gets one through token
//! exchange on first use.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use spin_swipe_core::ShopDomain;
use thiserror::Error;

use crate::db::{SessionStoreError, ShopSession};
use crate::error::AppError;
use crate::shopify::session_token::{self, SessionTokenError};
use crate::shopify::{AdminClient, AdminShopifyError};
use crate::state::AppState;

/// Query parameter carrying the session token on document requests.
pub const ID_TOKEN_PARAM: &str = "id_token";

/// Extractor that resolves the calling shop and an authorized Admin client.
///
/// Rejects with 401 `{"error": "Shop session missing or invalid"}` when no
/// shop can be resolved.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(ShopContext { shop, admin }: ShopContext) -> impl IntoResponse {
///     let selection = admin.get_spinning_selection().await?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ShopContext {
    /// Shop named by the session token.
    pub shop: ShopDomain,
    /// Admin API client for the shop.
    pub admin: AdminClient,
}

#[derive(Debug, Error)]
enum ResolveError {
    #[error("no session token on request")]
    MissingToken,
    #[error("session token rejected: {0}")]
    Token(#[from] SessionTokenError),
    #[error("session lookup failed: {0}")]
    Store(#[from] SessionStoreError),
    #[error("token exchange failed: {0}")]
    Exchange(#[from] AdminShopifyError),
}

/// Pull the session token from the `Authorization` header or the query.
fn session_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from);

    bearer.or_else(|| {
        let query = parts.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == ID_TOKEN_PARAM)
            .map(|(_, v)| v.into_owned())
            .filter(|t| !t.is_empty())
    })
}

async fn resolve(parts: &Parts, state: &AppState) -> Result<ShopContext, ResolveError> {
    let token = session_token(parts).ok_or(ResolveError::MissingToken)?;

    let shopify = state.shopify();
    let verified = session_token::verify(&token, shopify.api_key(), shopify.api_secret())?;
    let shop = verified.shop;

    let session = if let Some(session) = state.sessions().load_offline(&shop).await? {
        session
    } else {
        tracing::info!(shop = %shop, "No offline session, exchanging session token");
        let session: ShopSession = shopify.exchange_session_token(&shop, &token).await?.into();
        state.sessions().store(&session).await?;
        session
    };

    let admin = shopify.admin_client(&session);
    Ok(ShopContext { shop, admin })
}

impl FromRequestParts<AppState> for ShopContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve(parts, state).await.map_err(|e| {
            tracing::warn!(error = %e, path = %parts.uri.path(), "Shop session missing or invalid");
            AppError::Unauthenticated
        })
    }
}
