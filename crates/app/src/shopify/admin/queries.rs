//! GraphQL query definitions for Shopify Admin API.
//!
//! Uses `graphql_client` to generate type-safe Rust code from the documents
//! under `graphql/admin/queries`, checked against a schema trimmed to the
//! fields the app selects.

use graphql_client::GraphQLQuery;
use serde::Serialize;

use crate::shopify::types::UserError;

/// URL string.
#[allow(clippy::upper_case_acronyms)]
type URL = String;

// =============================================================================
// Shop
// =============================================================================

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/admin/schema.graphql",
    query_path = "graphql/admin/queries/shop.graphql",
    response_derives = "Debug, Clone"
)]
pub struct GetShopMetafield;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/admin/schema.graphql",
    query_path = "graphql/admin/queries/shop.graphql",
    response_derives = "Debug, Clone"
)]
pub struct GetShopId;

// =============================================================================
// Metafields
// =============================================================================

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/admin/schema.graphql",
    query_path = "graphql/admin/queries/metafields.graphql",
    response_derives = "Debug, Clone"
)]
pub struct GetProductSpinSwipe;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/admin/schema.graphql",
    query_path = "graphql/admin/queries/metafields.graphql",
    response_derives = "Debug, Clone"
)]
pub struct MetafieldsSet;

// =============================================================================
// Provisioning
// =============================================================================

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/admin/schema.graphql",
    query_path = "graphql/admin/queries/provisioning.graphql",
    response_derives = "Debug, Clone"
)]
pub struct MetafieldDefinitionCreate;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/admin/schema.graphql",
    query_path = "graphql/admin/queries/provisioning.graphql",
    response_derives = "Debug, Clone"
)]
pub struct WebhookSubscriptionCreate;

// =============================================================================
// User errors
// =============================================================================

/// Wire name of a generated enum value (`TAKEN`, `INVALID_VALUE`, ...).
fn enum_name<T: Serialize>(value: &T) -> Option<String> {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(String::from))
}

impl From<metafields_set::MetafieldsSetMetafieldsSetUserErrors> for UserError {
    fn from(e: metafields_set::MetafieldsSetMetafieldsSetUserErrors) -> Self {
        Self {
            code: e.code.as_ref().and_then(enum_name),
            field: e.field,
            message: e.message,
        }
    }
}

impl From<metafield_definition_create::MetafieldDefinitionCreateMetafieldDefinitionCreateUserErrors>
    for UserError
{
    fn from(
        e: metafield_definition_create::MetafieldDefinitionCreateMetafieldDefinitionCreateUserErrors,
    ) -> Self {
        Self {
            code: e.code.as_ref().and_then(enum_name),
            field: e.field,
            message: e.message,
        }
    }
}

impl From<webhook_subscription_create::WebhookSubscriptionCreateWebhookSubscriptionCreateUserErrors>
    for UserError
{
    fn from(
        e: webhook_subscription_create::WebhookSubscriptionCreateWebhookSubscriptionCreateUserErrors,
    ) -> Self {
        Self {
            field: e.field,
            message: e.message,
            code: None,
        }
    }
}
