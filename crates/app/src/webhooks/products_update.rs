//! `products/update`: log the product and its metafields. No state change.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{ProvisioningError, WebhookContext, WebhookHandler};

#[derive(Debug, Default, Deserialize)]
struct ProductPayload {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    metafields: Option<Vec<Value>>,
}

/// Handler for `products/update`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductsUpdateHandler;

fn summarize(payload: &Value) -> (Option<String>, usize) {
    let product = ProductPayload::deserialize(payload).unwrap_or_default();
    let id = product.id.map(|id| match id {
        Value::String(s) => s,
        other => other.to_string(),
    });
    (id, product.metafields.map_or(0, |m| m.len()))
}

#[async_trait]
impl WebhookHandler for ProductsUpdateHandler {
    async fn handle(&self, ctx: &WebhookContext) -> Result<(), ProvisioningError> {
        let (product_id, metafield_count) = summarize(&ctx.payload);
        tracing::info!(
            shop = %ctx.shop,
            product_id = product_id.as_deref().unwrap_or("unknown"),
            metafield_count,
            "Product updated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_summarize_product() {
        let payload = json!({
            "id": 788_032_119_674_292_922_u64,
            "title": "Example T-Shirt",
            "metafields": [{"namespace": "custom", "key": "spin_swipe_enable", "value": "true"}]
        });
        assert_eq!(
            summarize(&payload),
            (Some("788032119674292922".to_string()), 1)
        );
    }

    #[test]
    fn test_summarize_tolerates_odd_payloads() {
        assert_eq!(summarize(&Value::Null), (None, 0));
        assert_eq!(summarize(&json!({"id": "gid://shopify/Product/1"})), (Some("gid://shopify/Product/1".to_string()), 0));
        assert_eq!(summarize(&json!([1, 2])), (None, 0));
    }
}
