//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (database)
//!
//! # Embedded app
//! GET  /app                             - Landing page (frame-ancestors CSP)
//!
//! # OAuth
//! GET  /auth?shop=                      - Start install, redirect to consent
//! GET  /auth/callback                   - Finish install, register webhooks
//!
//! # Admin API (session token required)
//! GET  /api/spinning-selection          - Read the shop selection metafield
//! POST /api/spinning-selection          - Replace the shop selection metafield
//! GET  /api/products/{id}/spin-swipe    - Read a product's spin swipe fields
//! POST /api/products/{id}/spin-swipe    - Update a product's spin swipe fields
//!
//! # Public (no auth)
//! GET  /api/public/settings?shop=       - Menu settings scraped from the storefront
//!
//! # App proxy (signature required)
//! GET  /apps/spinning-tool-selection    - Selection for the storefront
//!
//! # Webhooks (HMAC required)
//! POST /webhooks                        - Topic dispatch
//! ```

use axum::Router;

use crate::state::AppState;

pub mod api;
mod app;
mod auth;
mod proxy;
mod webhooks;

/// Build all application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(app::router())
        .merge(auth::router())
        .merge(api::router())
        .merge(proxy::router())
        .merge(webhooks::router())
}

/// Decode a raw query string into ordered key/value pairs.
///
/// Signature checks need every pair, including repeated keys, so handlers
/// that verify a signature take the raw query instead of a typed `Query`.
pub(crate) fn query_pairs(query: Option<&str>) -> Vec<(String, String)> {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}
