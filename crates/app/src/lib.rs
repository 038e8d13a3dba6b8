//! Spin Swipe embedded app library.
//!
//! Backend for a Shopify embedded app that stores a "spinning tool
//! selection" document as a shop metafield, serves it to the storefront
//! through an app proxy, and manages per-product spin swipe metafields.
//!
//! The binary in `main.rs` wires this router to `PostgreSQL`, Sentry and the
//! cookie session layer; tests build it over an in-memory session store.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
pub mod webhooks;

use axum::{Router, extract::State, http::StatusCode, routing::get};

use state::AppState;

/// Build the application router with health checks and all routes.
///
/// The cookie session layer is not included; callers add it over the store
/// they run with.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };

    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
