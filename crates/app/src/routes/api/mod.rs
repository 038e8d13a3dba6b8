//! JSON API route handlers.
//!
//! Embedded endpoints authenticate with [`crate::middleware::ShopContext`];
//! the public settings endpoint takes no credentials.

pub mod products;
pub mod public;
pub mod spinning_selection;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(spinning_selection::router())
        .merge(products::router())
        .merge(public::router())
}
