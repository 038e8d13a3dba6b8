//! HTTP middleware and extractors.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Session layer (tower-sessions with `PostgreSQL` store, OAuth state only)
//!
//! Authentication is per route: [`ShopContext`] for embedded API calls, the
//! webhook and app proxy handlers verify their own signatures.

pub mod auth;
pub mod session;

pub use auth::ShopContext;
pub use session::create_session_layer;
