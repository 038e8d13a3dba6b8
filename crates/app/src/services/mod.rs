//! Business logic services.
//!
//! # Services
//!
//! - `menu` - Public storefront menu reader behind `/api/public/settings`

pub mod menu;

pub use menu::{MenuError, PublicSettings, fetch_public_settings};
