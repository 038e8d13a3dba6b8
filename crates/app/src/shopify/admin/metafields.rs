//! Metafield gateway: the spinning selection shop metafield and the
//! per-product spin swipe pair.
//!
//! Writes follow a two-step protocol: resolve the owner's global id, then
//! upsert with `metafieldsSet`. Nothing spans the two steps; the owner id is
//! assumed stable for the duration of one call and is never cached between
//! calls. Concurrent writers are last-write-wins at the store.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use spin_swipe_core::{
    GlobalId, MetafieldIdentifier, MetafieldType, SPIN_SWIPE_ENABLE, SPIN_SWIPE_TEXT,
    SPINNING_SELECTION, parse_or_none,
};
use thiserror::Error;
use tracing::instrument;

use super::AdminClient;
use super::queries::{
    GetProductSpinSwipe, GetShopId, GetShopMetafield, MetafieldsSet, get_product_spin_swipe,
    get_shop_id, get_shop_metafield, metafields_set,
};
use crate::shopify::AdminShopifyError;
use crate::shopify::types::UserError;

/// Errors from metafield reads and writes.
#[derive(Debug, Error)]
pub enum MetafieldError {
    /// The owner's global id could not be read back before a write.
    #[error("Could not resolve shop owner id: {0}")]
    OwnerResolution(String),

    /// The product does not exist (or is not visible to the token).
    #[error("Product not found: {0}")]
    ProductNotFound(GlobalId),

    /// Transport or API failure.
    #[error(transparent)]
    Shopify(#[from] AdminShopifyError),
}

/// Raw result of a `metafieldsSet` call.
///
/// User errors are returned as data rather than failing the call; callers
/// decide whether they matter.
#[derive(Debug, Clone, Default)]
pub struct SetConfirmation {
    /// Validation errors reported by the store.
    pub user_errors: Vec<UserError>,
}

impl SetConfirmation {
    /// Whether the store reported any user errors.
    #[must_use]
    pub fn has_user_errors(&self) -> bool {
        !self.user_errors.is_empty()
    }
}

impl From<metafields_set::ResponseData> for SetConfirmation {
    fn from(data: metafields_set::ResponseData) -> Self {
        data.metafields_set.map_or_else(Self::default, |p| Self {
            user_errors: p.user_errors.into_iter().map(UserError::from).collect(),
        })
    }
}

/// Spin swipe settings of one product, as the admin panels show them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinSwipeSettings {
    /// Product global id.
    pub product_id: GlobalId,
    /// `true` only when the stored boolean is `"true"`.
    pub enabled: bool,
    /// Caption, if one was ever set.
    pub text: Option<String>,
}

/// Partial update of a product's spin swipe settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SpinSwipeUpdate {
    /// New toggle value.
    #[serde(default)]
    pub enabled: Option<bool>,
    /// New caption.
    #[serde(default)]
    pub text: Option<String>,
}

impl SpinSwipeUpdate {
    /// Whether the update carries no fields.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.enabled.is_none() && self.text.is_none()
    }
}

fn set_input(
    owner: &GlobalId,
    identifier: MetafieldIdentifier,
    value_type: MetafieldType,
    value: String,
) -> metafields_set::MetafieldsSetInput {
    metafields_set::MetafieldsSetInput {
        owner_id: owner.to_string(),
        namespace: Some(identifier.namespace.to_string()),
        key: identifier.key.to_string(),
        type_: Some(value_type.as_str().to_string()),
        value,
    }
}

impl AdminClient {
    // =========================================================================
    // Spinning selection (shop)
    // =========================================================================

    /// Read the spinning selection document.
    ///
    /// Returns `None` when the metafield was never set, is empty, or holds
    /// text that is not valid JSON.
    ///
    /// # Errors
    ///
    /// Returns an error only if the read itself fails.
    #[instrument(skip(self), fields(shop = %self.shop()))]
    pub async fn get_spinning_selection(&self) -> Result<Option<Value>, AdminShopifyError> {
        let variables = get_shop_metafield::Variables {
            namespace: SPINNING_SELECTION.namespace.to_string(),
            key: SPINNING_SELECTION.key.to_string(),
        };

        let response = self.execute::<GetShopMetafield>(variables).await?;

        let raw = response
            .shop
            .and_then(|shop| shop.metafield)
            .and_then(|metafield| metafield.value);

        let Some(raw) = raw else {
            return Ok(None);
        };

        let parsed = parse_or_none(&raw);
        if parsed.is_none() {
            tracing::warn!(raw_len = raw.len(), "Stored spinning selection is not valid JSON");
        }
        Ok(parsed)
    }

    /// Resolve the shop's global id, the owner of shop metafields.
    ///
    /// # Errors
    ///
    /// Returns `MetafieldError::OwnerResolution` if the response carries no
    /// usable id (GraphQL errors, null shop, empty or malformed id), or
    /// `MetafieldError::Shopify` on transport failure.
    #[instrument(skip(self), fields(shop = %self.shop()))]
    pub async fn resolve_shop_owner_id(&self) -> Result<GlobalId, MetafieldError> {
        let response = match self.execute::<GetShopId>(get_shop_id::Variables).await {
            Ok(response) => response,
            Err(e @ AdminShopifyError::GraphQL(_)) => {
                tracing::error!(error = %e, "Shop id query returned errors");
                return Err(MetafieldError::OwnerResolution(e.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let Some(id) = response
            .shop
            .as_ref()
            .and_then(|shop| shop.id.as_deref())
            .filter(|id| !id.is_empty())
        else {
            tracing::error!(response = ?response, "Shop id missing from response");
            return Err(MetafieldError::OwnerResolution(
                "shop id missing from response".to_string(),
            ));
        };

        GlobalId::parse(id).map_err(|e| {
            tracing::error!(response = ?response, "Shop id is not a global id");
            MetafieldError::OwnerResolution(format!("malformed shop id {id:?}: {e}"))
        })
    }

    /// Write the spinning selection document.
    ///
    /// Resolves the owner id first; the upsert is only sent once that
    /// succeeds. Any JSON value is accepted, `null` included, and stored as
    /// its serialized text with type `json`.
    ///
    /// # Errors
    ///
    /// Returns `MetafieldError::OwnerResolution` if the owner id cannot be
    /// resolved, or `MetafieldError::Shopify` if either call fails. User
    /// errors reported by the store are returned in the confirmation.
    #[instrument(skip(self, value), fields(shop = %self.shop()))]
    pub async fn set_spinning_selection(
        &self,
        value: &Value,
    ) -> Result<SetConfirmation, MetafieldError> {
        let owner_id = self.resolve_shop_owner_id().await?;

        let variables = metafields_set::Variables {
            metafields: vec![set_input(
                &owner_id,
                SPINNING_SELECTION,
                MetafieldType::Json,
                value.to_string(),
            )],
        };

        let response = self.execute::<MetafieldsSet>(variables).await?;
        let confirmation = SetConfirmation::from(response);

        if confirmation.has_user_errors() {
            tracing::warn!(
                user_errors = ?confirmation.user_errors,
                "metafieldsSet reported user errors for spinning selection"
            );
        }

        Ok(confirmation)
    }

    // =========================================================================
    // Spin swipe (product)
    // =========================================================================

    /// Read a product's spin swipe settings.
    ///
    /// # Errors
    ///
    /// Returns `MetafieldError::ProductNotFound` if the product does not
    /// exist, or `MetafieldError::Shopify` if the read fails.
    #[instrument(skip(self), fields(shop = %self.shop(), product_id = %product_id))]
    pub async fn get_spin_swipe(
        &self,
        product_id: &GlobalId,
    ) -> Result<SpinSwipeSettings, MetafieldError> {
        let variables = get_product_spin_swipe::Variables {
            id: product_id.to_string(),
            namespace: SPIN_SWIPE_ENABLE.namespace.to_string(),
            enable_key: SPIN_SWIPE_ENABLE.key.to_string(),
            text_key: SPIN_SWIPE_TEXT.key.to_string(),
        };

        let response = self.execute::<GetProductSpinSwipe>(variables).await?;
        let product = response
            .product
            .ok_or_else(|| MetafieldError::ProductNotFound(product_id.clone()))?;

        let enabled = product
            .enable
            .and_then(|m| m.value)
            .is_some_and(|v| v == "true");
        let text = product.text.and_then(|m| m.value);

        Ok(SpinSwipeSettings {
            product_id: product_id.clone(),
            enabled,
            text,
        })
    }

    /// Write the fields present in `update` with a single `metafieldsSet`.
    ///
    /// An empty update sends nothing and returns an empty confirmation.
    ///
    /// # Errors
    ///
    /// Returns `MetafieldError::Shopify` if the call fails.
    #[instrument(skip(self, update), fields(shop = %self.shop(), product_id = %product_id))]
    pub async fn set_spin_swipe(
        &self,
        product_id: &GlobalId,
        update: &SpinSwipeUpdate,
    ) -> Result<SetConfirmation, MetafieldError> {
        let mut metafields = Vec::with_capacity(2);
        if let Some(enabled) = update.enabled {
            metafields.push(set_input(
                product_id,
                SPIN_SWIPE_ENABLE,
                MetafieldType::Boolean,
                enabled.to_string(),
            ));
        }
        if let Some(text) = &update.text {
            metafields.push(set_input(
                product_id,
                SPIN_SWIPE_TEXT,
                MetafieldType::SingleLineTextField,
                text.clone(),
            ));
        }

        if metafields.is_empty() {
            return Ok(SetConfirmation::default());
        }

        let response = self
            .execute::<MetafieldsSet>(metafields_set::Variables { metafields })
            .await?;
        let confirmation = SetConfirmation::from(response);

        if confirmation.has_user_errors() {
            tracing::warn!(
                user_errors = ?confirmation.user_errors,
                "metafieldsSet reported user errors for spin swipe"
            );
        }

        Ok(confirmation)
    }
}
