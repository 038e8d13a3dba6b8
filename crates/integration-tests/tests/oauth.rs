//! OAuth install flow, landing page and health checks.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use reqwest::header::{CONTENT_SECURITY_POLICY, LOCATION, SET_COOKIE};
use spin_swipe_app::db::SessionStore;
use spin_swipe_app::shopify::hmac;
use spin_swipe_core::ShopDomain;
use spin_swipe_integration_tests::{API_SECRET, TestApp};

const SHOP: &str = "spin-demo.myshopify.com";

fn query_value(location: &str, name: &str) -> Option<String> {
    let url = url::Url::parse(location).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

fn signed_callback(params: &[(&str, &str)]) -> String {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    let signature = hmac::sign_query(&pairs, API_SECRET);
    pairs.push(("hmac".to_string(), signature));
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

#[tokio::test]
async fn install_flow_stores_session_and_registers_webhooks() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.at(&format!("/auth?shop={SHOP}")))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    let cookie = response.headers()[SET_COOKIE].to_str().unwrap().split(';').next().unwrap().to_string();
    let location = response.headers()[LOCATION].to_str().unwrap().to_string();
    assert!(location.starts_with(&format!("{}/admin/oauth/authorize?", app.shopify.url)));
    assert_eq!(query_value(&location, "client_id").as_deref(), Some(spin_swipe_integration_tests::API_KEY));
    let state = query_value(&location, "state").unwrap();

    let query = signed_callback(&[
        ("code", "0907a61c0c8d55e99db179b68161bc00"),
        ("host", "YWRtaW4uc2hvcGlmeS5jb20vc3RvcmUvc3Bpbi1kZW1v"),
        ("shop", SHOP),
        ("state", &state),
        ("timestamp", "1337178173"),
    ]);
    let response = app
        .client
        .get(app.at(&format!("/auth/callback?{query}")))
        .header("cookie", cookie)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_redirection(), "status {}", response.status());
    let location = response.headers()[LOCATION].to_str().unwrap();
    assert!(location.starts_with("/app?shop=spin-demo.myshopify.com"));

    let shop = ShopDomain::parse(SHOP).unwrap();
    assert!(app.sessions.load_offline(&shop).await.unwrap().is_some());

    let topics = app.shopify.webhook_topics();
    assert!(topics.contains("APP_UNINSTALLED"));
    assert!(topics.contains("PRODUCTS_UPDATE"));
    assert_eq!(app.shopify.definitions().len(), 2);
}

#[tokio::test]
async fn oauth_state_is_single_use() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.at(&format!("/auth?shop={SHOP}")))
        .send()
        .await
        .unwrap();
    let cookie = response.headers()[SET_COOKIE].to_str().unwrap().split(';').next().unwrap().to_string();
    let location = response.headers()[LOCATION].to_str().unwrap().to_string();
    let state = query_value(&location, "state").unwrap();

    let query = signed_callback(&[("code", "abc"), ("shop", SHOP), ("state", &state)]);
    let callback = || {
        app.client
            .get(app.at(&format!("/auth/callback?{query}")))
            .header("cookie", cookie.clone())
            .send()
    };

    let response = callback().await.unwrap();
    assert!(response.status().is_redirection(), "status {}", response.status());

    let response = callback().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.shopify.token_requests().len(), 1);
}

#[tokio::test]
async fn callback_with_bad_hmac_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.at(&format!("/auth/callback?code=abc&shop={SHOP}&state=x&hmac=deadbeef")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(app.shopify.token_requests().is_empty());
}

#[tokio::test]
async fn callback_with_unknown_state_is_rejected() {
    let app = TestApp::spawn().await;

    let query = signed_callback(&[("code", "abc"), ("shop", SHOP), ("state", "forged")]);
    let response = app
        .client
        .get(app.at(&format!("/auth/callback?{query}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.shopify.token_requests().is_empty());
}

#[tokio::test]
async fn auth_requires_a_shop() {
    let app = TestApp::spawn().await;

    let response = app.client.get(app.at("/auth")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .client
        .get(app.at("/auth?shop=attacker.example.com"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn landing_page_is_embeddable_by_the_shop() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.at(&format!("/app?shop={SHOP}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[CONTENT_SECURITY_POLICY],
        "frame-ancestors https://spin-demo.myshopify.com https://admin.shopify.com;"
    );
    let html = response.text().await.unwrap();
    assert!(html.contains("https://shopify-management-app.vercel.app"));
}

#[tokio::test]
async fn health_checks() {
    let app = TestApp::spawn().await;

    let response = app.client.get(app.at("/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");

    let response = app.client.get(app.at("/health/ready")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
