//! `app/installed`: ensure the product metafield definitions exist.

use async_trait::async_trait;
use futures::future::join_all;
use spin_swipe_core::{SPIN_SWIPE_DEFINITIONS, ShopDomain};

use super::{ProvisioningError, WebhookContext, WebhookHandler};
use crate::shopify::{AdminClient, AdminShopifyError, DefinitionOutcome};

/// Create every spin swipe definition on the shop.
///
/// Each definition is attempted regardless of the others; an existing
/// definition counts as success.
///
/// # Errors
///
/// Returns `ProvisioningError::Definitions` naming every definition that is
/// not present afterwards.
pub async fn provision_definitions(
    admin: &AdminClient,
) -> Result<Vec<DefinitionOutcome>, ProvisioningError> {
    let results = join_all(
        SPIN_SWIPE_DEFINITIONS
            .iter()
            .map(|spec| admin.ensure_metafield_definition(spec)),
    )
    .await;

    collect_outcomes(admin.shop(), results)
}

/// Pair each definition with its result; any definition not present is a failure.
fn collect_outcomes(
    shop: &ShopDomain,
    results: Vec<Result<DefinitionOutcome, AdminShopifyError>>,
) -> Result<Vec<DefinitionOutcome>, ProvisioningError> {
    let mut outcomes = Vec::with_capacity(results.len());
    let mut failures = Vec::new();

    for (spec, result) in SPIN_SWIPE_DEFINITIONS.iter().zip(results) {
        let key = spec.identifier.key;
        match result {
            Ok(outcome) if outcome.is_present() => {
                tracing::info!(%shop, key, ?outcome, "Definition in place");
                outcomes.push(outcome);
            }
            Ok(outcome) => {
                tracing::error!(%shop, key, ?outcome, "Definition rejected");
                failures.push(key.to_string());
                outcomes.push(outcome);
            }
            Err(e) => {
                tracing::error!(%shop, key, error = %e, "Definition request failed");
                failures.push(key.to_string());
            }
        }
    }

    if failures.is_empty() {
        Ok(outcomes)
    } else {
        Err(ProvisioningError::Definitions(failures))
    }
}

/// Handler for `app/installed`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstallHandler;

#[async_trait]
impl WebhookHandler for InstallHandler {
    async fn handle(&self, ctx: &WebhookContext) -> Result<(), ProvisioningError> {
        let admin = ctx
            .admin
            .as_ref()
            .ok_or_else(|| ProvisioningError::NoSession(ctx.shop.clone()))?;

        provision_definitions(admin).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::webhooks::Topic;

    fn shop() -> ShopDomain {
        ShopDomain::parse("demo.myshopify.com").expect("valid shop")
    }

    #[test]
    fn test_existing_definitions_count_as_present() {
        let outcomes = collect_outcomes(
            &shop(),
            vec![
                Ok(DefinitionOutcome::Created { id: "gid://shopify/MetafieldDefinition/1".into() }),
                Ok(DefinitionOutcome::AlreadyExists),
            ],
        )
        .expect("both present");
        assert_eq!(outcomes.len(), 2);
    }

    #[test]
    fn test_rejected_and_failed_definitions_are_named() {
        let err = collect_outcomes(
            &shop(),
            vec![
                Ok(DefinitionOutcome::Rejected(vec![])),
                Err(AdminShopifyError::RateLimited(2)),
            ],
        )
        .unwrap_err();
        let ProvisioningError::Definitions(keys) = err else {
            panic!("expected definition failures, got {err:?}");
        };
        assert_eq!(keys, ["spin_swipe_enable", "spin_swipe_text"]);
    }

    #[tokio::test]
    async fn test_install_without_session_fails() {
        let ctx = WebhookContext {
            topic: Topic::AppInstalled,
            shop: shop(),
            payload: Value::Null,
            webhook_id: None,
            api_version: None,
            admin: None,
        };

        let err = InstallHandler.handle(&ctx).await.unwrap_err();
        assert!(matches!(err, ProvisioningError::NoSession(_)));
    }
}
