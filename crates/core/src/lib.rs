//! Spin Swipe Core - Shared types library.
//!
//! This crate provides the domain types used by every Spin Swipe component:
//! - `app` - The embedded Shopify app server (API, webhooks, OAuth)
//! - `cli` - Command-line tools for migrations and operator tasks
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Shop domains, global IDs, metafield identities and the
//!   fail-soft JSON document parser

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
