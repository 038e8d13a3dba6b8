//! Embedded landing page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Query, State},
    http::header::CONTENT_SECURITY_POLICY,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use spin_swipe_core::ShopDomain;

use crate::state::AppState;

/// Build the landing page router.
pub fn router() -> Router<AppState> {
    Router::new().route("/app", get(index))
}

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "app/index.html")]
pub struct AppIndexTemplate {
    pub api_key: String,
    pub shop: Option<String>,
    pub management_app_url: String,
}

#[derive(Debug, Deserialize)]
pub struct AppParams {
    pub shop: Option<String>,
}

/// `frame-ancestors` policy allowing the shop admin to embed the page.
fn frame_ancestors(shop: Option<&ShopDomain>) -> String {
    shop.map_or_else(
        || "frame-ancestors https://admin.shopify.com;".to_string(),
        |shop| format!("frame-ancestors https://{shop} https://admin.shopify.com;"),
    )
}

/// GET /app - Landing page with a link to the management app.
pub async fn index(State(state): State<AppState>, Query(params): Query<AppParams>) -> impl IntoResponse {
    let shop = params.shop.as_deref().and_then(|s| ShopDomain::parse(s).ok());

    let template = AppIndexTemplate {
        api_key: state.shopify().api_key().to_string(),
        shop: shop.as_ref().map(ToString::to_string),
        management_app_url: state.config().management_app_url.clone(),
    };

    ([(CONTENT_SECURITY_POLICY, frame_ancestors(shop.as_ref()))], template)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_ancestors() {
        let shop = ShopDomain::parse("demo.myshopify.com").expect("valid shop");
        assert_eq!(
            frame_ancestors(Some(&shop)),
            "frame-ancestors https://demo.myshopify.com https://admin.shopify.com;"
        );
        assert_eq!(frame_ancestors(None), "frame-ancestors https://admin.shopify.com;");
    }

    #[test]
    fn test_template_renders_button() {
        let html = AppIndexTemplate {
            api_key: "app-key".to_string(),
            shop: Some("demo.myshopify.com".to_string()),
            management_app_url: "https://shopify-management-app.vercel.app".to_string(),
        }
        .render()
        .expect("template renders");

        assert!(html.contains(r#"href="https://shopify-management-app.vercel.app""#));
        assert!(html.contains("demo.myshopify.com"));
    }
}
