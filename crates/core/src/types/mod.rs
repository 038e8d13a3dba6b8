//! Core types for Spin Swipe.
//!
//! This module provides type-safe wrappers for the app's domain concepts.

pub mod document;
pub mod gid;
pub mod metafield;
pub mod shop;

pub use document::parse_or_none;
pub use gid::{GlobalId, GlobalIdError};
pub use metafield::{
    AdminAccess, MetafieldDefinitionSpec, MetafieldIdentifier, MetafieldOwnerType, MetafieldType,
    SPIN_SWIPE_DEFINITIONS, SPIN_SWIPE_ENABLE, SPIN_SWIPE_TEXT, SPINNING_SELECTION,
};
pub use shop::{ShopDomain, ShopDomainError};
