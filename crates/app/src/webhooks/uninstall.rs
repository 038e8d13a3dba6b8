//! `app/uninstalled`: drop the shop's sessions.

use std::sync::Arc;

use async_trait::async_trait;

use super::{ProvisioningError, WebhookContext, WebhookHandler};
use crate::db::SessionStore;

/// Handler for `app/uninstalled`.
pub struct UninstallHandler {
    sessions: Arc<dyn SessionStore>,
}

impl UninstallHandler {
    /// Create the handler over a session store.
    #[must_use]
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl WebhookHandler for UninstallHandler {
    async fn handle(&self, ctx: &WebhookContext) -> Result<(), ProvisioningError> {
        let deleted = self.sessions.delete_by_shop(&ctx.shop).await?;
        tracing::info!(shop = %ctx.shop, deleted, "Sessions removed on uninstall");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use serde_json::Value;
    use spin_swipe_core::ShopDomain;

    use super::*;
    use crate::db::{MemorySessionStore, ShopSession};
    use crate::webhooks::Topic;

    fn context(shop: &ShopDomain) -> WebhookContext {
        WebhookContext {
            topic: Topic::AppUninstalled,
            shop: shop.clone(),
            payload: Value::Null,
            webhook_id: Some("b54557e4-bdd9-4b37-8a5f-bf7d70bcd043".to_string()),
            api_version: Some("2024-04".to_string()),
            admin: None,
        }
    }

    #[tokio::test]
    async fn test_uninstall_deletes_sessions() {
        let store = Arc::new(MemorySessionStore::new());
        let shop = ShopDomain::parse("demo.myshopify.com").expect("valid shop");
        store
            .store(&ShopSession::offline(shop.clone(), SecretString::from("t"), String::new()))
            .await
            .expect("stored");

        UninstallHandler::new(store.clone())
            .handle(&context(&shop))
            .await
            .expect("handled");

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_uninstall_without_sessions_succeeds() {
        let store = Arc::new(MemorySessionStore::new());
        let shop = ShopDomain::parse("gone.myshopify.com").expect("valid shop");

        UninstallHandler::new(store)
            .handle(&context(&shop))
            .await
            .expect("zero rows is success");
    }
}
