//! Install-time provisioning: metafield definitions and webhook subscriptions.

use spin_swipe_core::{AdminAccess, MetafieldDefinitionSpec, MetafieldOwnerType};
use tracing::instrument;

use super::AdminClient;
use super::queries::metafield_definition_create::{
    MetafieldAdminAccessInput, MetafieldDefinitionInput,
};
use super::queries::webhook_subscription_create::{
    WebhookSubscriptionFormat, WebhookSubscriptionTopic,
};
use super::queries::{
    MetafieldDefinitionCreate, WebhookSubscriptionCreate, metafield_definition_create,
    webhook_subscription_create,
};
use crate::shopify::AdminShopifyError;
use crate::shopify::types::UserError;

/// Result of creating one metafield definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionOutcome {
    /// The definition was created by this call.
    Created {
        /// Global id of the new definition.
        id: String,
    },
    /// A definition with the same owner type, namespace and key exists.
    AlreadyExists,
    /// The store refused the definition for another reason.
    Rejected(Vec<UserError>),
}

impl DefinitionOutcome {
    /// Whether the definition is present after the call.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Created { .. } | Self::AlreadyExists)
    }
}

/// Result of registering one webhook subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookRegistration {
    /// Subscription created.
    Registered {
        /// Global id of the subscription.
        id: String,
    },
    /// The callback was already subscribed to the topic.
    AlreadyRegistered,
    /// The store refused the subscription.
    Rejected(Vec<UserError>),
}

impl WebhookRegistration {
    /// Whether the subscription is in place after the call.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Registered { .. } | Self::AlreadyRegistered)
    }
}

const fn owner_type(owner: MetafieldOwnerType) -> metafield_definition_create::MetafieldOwnerType {
    match owner {
        MetafieldOwnerType::Shop => metafield_definition_create::MetafieldOwnerType::SHOP,
        MetafieldOwnerType::Product => metafield_definition_create::MetafieldOwnerType::PRODUCT,
    }
}

const fn admin_access(access: AdminAccess) -> MetafieldAdminAccessInput {
    match access {
        AdminAccess::MerchantRead => MetafieldAdminAccessInput::MERCHANT_READ,
        AdminAccess::MerchantReadWrite => MetafieldAdminAccessInput::MERCHANT_READ_WRITE,
    }
}

fn definition_input(spec: &MetafieldDefinitionSpec) -> MetafieldDefinitionInput {
    MetafieldDefinitionInput {
        name: spec.name.to_string(),
        namespace: Some(spec.identifier.namespace.to_string()),
        key: spec.identifier.key.to_string(),
        type_: spec.value_type.as_str().to_string(),
        owner_type: owner_type(spec.owner_type),
        pin: Some(spec.pin),
        access: Some(metafield_definition_create::MetafieldAccessInput {
            admin: Some(admin_access(spec.access)),
        }),
    }
}

/// Map an Admin API topic name onto the subscription enum.
fn subscription_topic(name: &str) -> WebhookSubscriptionTopic {
    match name {
        "APP_UNINSTALLED" => WebhookSubscriptionTopic::APP_UNINSTALLED,
        "PRODUCTS_UPDATE" => WebhookSubscriptionTopic::PRODUCTS_UPDATE,
        other => WebhookSubscriptionTopic::Other(other.to_string()),
    }
}

fn classify_user_errors(user_errors: Vec<UserError>) -> Result<(), (bool, Vec<UserError>)> {
    if user_errors.is_empty() {
        return Ok(());
    }
    let already_exists = user_errors.iter().all(UserError::is_already_exists);
    Err((already_exists, user_errors))
}

impl AdminClient {
    /// Create a metafield definition, treating a duplicate as success.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails. Refusals reported as user
    /// errors come back as [`DefinitionOutcome::Rejected`].
    #[instrument(skip(self, spec), fields(shop = %self.shop(), key = %spec.identifier.key))]
    pub async fn ensure_metafield_definition(
        &self,
        spec: &MetafieldDefinitionSpec,
    ) -> Result<DefinitionOutcome, AdminShopifyError> {
        let variables = metafield_definition_create::Variables {
            definition: definition_input(spec),
        };

        let response = self.execute::<MetafieldDefinitionCreate>(variables).await?;
        let Some(payload) = response.metafield_definition_create else {
            return Ok(DefinitionOutcome::Rejected(vec![]));
        };

        let user_errors = payload.user_errors.into_iter().map(UserError::from).collect();
        if let Err((already_exists, user_errors)) = classify_user_errors(user_errors) {
            if already_exists {
                tracing::debug!("Metafield definition already exists");
                return Ok(DefinitionOutcome::AlreadyExists);
            }
            tracing::warn!(?user_errors, "Metafield definition rejected");
            return Ok(DefinitionOutcome::Rejected(user_errors));
        }

        Ok(payload.created_definition.map_or_else(
            || DefinitionOutcome::Rejected(vec![]),
            |definition| {
                tracing::info!(definition_id = %definition.id, name = %definition.name, "Metafield definition created");
                DefinitionOutcome::Created { id: definition.id }
            },
        ))
    }

    /// Subscribe `callback_url` to a webhook topic with JSON payloads.
    ///
    /// `topic` is the GraphQL enum name (e.g. `APP_UNINSTALLED`).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(shop = %self.shop()))]
    pub async fn register_webhook(
        &self,
        topic: &str,
        callback_url: &str,
    ) -> Result<WebhookRegistration, AdminShopifyError> {
        let variables = webhook_subscription_create::Variables {
            topic: subscription_topic(topic),
            webhook_subscription: webhook_subscription_create::WebhookSubscriptionInput {
                callback_url: Some(callback_url.to_string()),
                format: Some(WebhookSubscriptionFormat::JSON),
            },
        };

        let response = self.execute::<WebhookSubscriptionCreate>(variables).await?;
        let Some(payload) = response.webhook_subscription_create else {
            return Ok(WebhookRegistration::Rejected(vec![]));
        };

        let user_errors = payload.user_errors.into_iter().map(UserError::from).collect();
        if let Err((already_exists, user_errors)) = classify_user_errors(user_errors) {
            if already_exists {
                return Ok(WebhookRegistration::AlreadyRegistered);
            }
            tracing::warn!(?user_errors, "Webhook subscription rejected");
            return Ok(WebhookRegistration::Rejected(user_errors));
        }

        Ok(payload.webhook_subscription.map_or_else(
            || WebhookRegistration::Rejected(vec![]),
            |subscription| WebhookRegistration::Registered {
                id: subscription.id,
            },
        ))
    }
}
