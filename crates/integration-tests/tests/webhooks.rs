//! Webhook delivery: authentication, install provisioning and uninstall.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::json;
use spin_swipe_app::db::SessionStore;
use spin_swipe_integration_tests::{API_SECRET, TestApp};

const SHOP: &str = "spin-demo.myshopify.com";

fn definition_keys(app: &TestApp) -> Vec<String> {
    let mut keys: Vec<String> = app
        .shopify
        .definitions()
        .into_iter()
        .map(|(namespace, key)| format!("{namespace}.{key}"))
        .collect();
    keys.sort();
    keys
}

#[tokio::test]
async fn install_provisions_definitions_idempotently() {
    let app = TestApp::spawn().await;
    app.install(SHOP).await;

    for _ in 0..2 {
        let response = app.webhook("app/installed", SHOP, &json!({})).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(
        definition_keys(&app),
        vec!["custom.spin_swipe_enable", "custom.spin_swipe_text"]
    );
    assert_eq!(app.shopify.calls("MetafieldDefinitionCreate"), 4);
}

#[tokio::test]
async fn uninstall_deletes_sessions() {
    let app = TestApp::spawn().await;
    let shop = app.install(SHOP).await;

    let response = app.webhook("app/uninstalled", SHOP, &json!({"id": 1})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.sessions.load_offline(&shop).await.unwrap().is_none());
}

#[tokio::test]
async fn uninstall_without_sessions_succeeds() {
    let app = TestApp::spawn().await;

    let response = app.webhook("app/uninstalled", SHOP, &json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.sessions.is_empty().await);
}

#[tokio::test]
async fn product_update_and_unknown_topics_are_acknowledged() {
    let app = TestApp::spawn().await;
    app.install(SHOP).await;

    let response = app
        .webhook("products/update", SHOP, &json!({"id": 632_910_392, "title": "IPod Nano"}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.webhook("orders/create", SHOP, &json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn bad_hmac_is_rejected_before_dispatch() {
    let app = TestApp::spawn().await;
    let shop = app.install(SHOP).await;

    let response = app
        .client
        .post(app.at("/webhooks"))
        .header("x-shopify-hmac-sha256", "bm90IGEgc2lnbmF0dXJl")
        .header("x-shopify-topic", "app/uninstalled")
        .header("x-shopify-shop-domain", SHOP)
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Nothing was deleted
    assert!(app.sessions.load_offline(&shop).await.unwrap().is_some());
}

#[tokio::test]
async fn missing_topic_header_is_a_bad_request() {
    let app = TestApp::spawn().await;
    let body = b"{}";
    let signature = spin_swipe_app::shopify::hmac::sign_webhook(body, API_SECRET);

    let response = app
        .client
        .post(app.at("/webhooks"))
        .header("x-shopify-hmac-sha256", signature)
        .header("x-shopify-shop-domain", SHOP)
        .body(body.to_vec())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
