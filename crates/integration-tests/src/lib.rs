//! Integration test harness for Spin Swipe.
//!
//! [`TestApp::spawn`] starts two servers on ephemeral ports:
//!
//! - a [`MockShopify`] that answers the Admin GraphQL operations the app
//!   sends, the OAuth token endpoint and the storefront `/pages/menu` page;
//! - the real app router, with an in-memory session store and every
//!   shop-bound request routed to the mock.
//!
//! No database is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p spin-swipe-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::{HashMap, HashSet};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use spin_swipe_app::config::{AppConfig, ShopifyAppConfig};
use spin_swipe_app::db::{MemorySessionStore, SessionStore, ShopSession};
use spin_swipe_app::shopify::{hmac, session_token};
use spin_swipe_app::state::AppState;
use spin_swipe_core::ShopDomain;
use tower_sessions::{MemoryStore, SessionManagerLayer};

/// App client id used by every test.
pub const API_KEY: &str = "spin-swipe-test-key";

/// App client secret used by every test.
pub const API_SECRET: &str = "k3v9Qm2xT7pLr4Wz8Ns1Yb6Hd0Fj5Ca";

/// Shop global id the mock reports by default.
pub const SHOP_GID: &str = "gid://shopify/Shop/548380009";

/// Access token the mock OAuth endpoint hands out.
pub const MOCK_ACCESS_TOKEN: &str = "shpat_mock_offline_token";

// =============================================================================
// Mock Shopify
// =============================================================================

#[derive(Debug, Default)]
struct MockData {
    shop_id: Option<String>,
    /// Metafield values keyed by (owner id, namespace, key).
    metafields: HashMap<(String, String, String), String>,
    products: HashSet<String>,
    definitions: HashSet<(String, String)>,
    webhooks: HashSet<String>,
    calls: HashMap<String, usize>,
    menu_page: (u16, String),
    token_requests: Vec<HashMap<String, String>>,
}

/// In-process stand-in for a shop's Admin API and storefront.
#[derive(Debug, Clone)]
pub struct MockShopify {
    /// Base URL, without trailing slash.
    pub url: String,
    data: Arc<Mutex<MockData>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphQLRequest {
    operation_name: String,
    #[serde(default)]
    variables: Value,
}

fn str_var<'a>(variables: &'a Value, name: &str) -> &'a str {
    variables.get(name).and_then(Value::as_str).unwrap_or_default()
}

impl MockData {
    fn graphql(&mut self, request: &GraphQLRequest) -> Value {
        *self.calls.entry(request.operation_name.clone()).or_default() += 1;
        let vars = &request.variables;

        match request.operation_name.as_str() {
            "GetShopMetafield" => {
                let metafield = self.shop_id.as_ref().and_then(|owner| {
                    self.metafields.get(&(
                        owner.clone(),
                        str_var(vars, "namespace").to_string(),
                        str_var(vars, "key").to_string(),
                    ))
                });
                json!({"data": {"shop": {
                    "metafield": metafield.map(|value| json!({"id": "gid://shopify/Metafield/1", "value": value}))
                }}})
            }
            "GetShopId" => json!({"data": {"shop": {"id": self.shop_id}}}),
            "MetafieldsSet" => {
                let inputs = vars
                    .get("metafields")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                let mut written = Vec::new();
                for input in inputs {
                    let owner = str_var(&input, "ownerId").to_string();
                    let namespace = str_var(&input, "namespace").to_string();
                    let key = str_var(&input, "key").to_string();
                    let value = str_var(&input, "value").to_string();
                    written.push(json!({
                        "id": format!("gid://shopify/Metafield/{}", self.metafields.len() + 1),
                        "namespace": namespace,
                        "key": key,
                        "value": value,
                    }));
                    self.metafields.insert((owner, namespace, key), value);
                }
                json!({"data": {"metafieldsSet": {"metafields": written, "userErrors": []}}})
            }
            "GetProductSpinSwipe" => {
                let id = str_var(vars, "id");
                if !self.products.contains(id) {
                    return json!({"data": {"product": null}});
                }
                let namespace = str_var(vars, "namespace");
                let value = |key: &str| {
                    self.metafields
                        .get(&(id.to_string(), namespace.to_string(), key.to_string()))
                        .map(|value| json!({"value": value}))
                };
                json!({"data": {"product": {
                    "id": id,
                    "enable": value(str_var(vars, "enableKey")),
                    "text": value(str_var(vars, "textKey")),
                }}})
            }
            "MetafieldDefinitionCreate" => {
                let definition = vars.get("definition").cloned().unwrap_or_default();
                let namespace = str_var(&definition, "namespace").to_string();
                let key = str_var(&definition, "key").to_string();
                if !self.definitions.insert((namespace.clone(), key.clone())) {
                    return json!({"data": {"metafieldDefinitionCreate": {
                        "createdDefinition": null,
                        "userErrors": [{
                            "field": ["definition", "key"],
                            "message": "Key is in use for Product metafields on the 'custom' namespace.",
                            "code": "TAKEN",
                        }],
                    }}});
                }
                json!({"data": {"metafieldDefinitionCreate": {
                    "createdDefinition": {
                        "id": format!("gid://shopify/MetafieldDefinition/{}", self.definitions.len()),
                        "name": str_var(&definition, "name"),
                        "namespace": namespace,
                        "key": key,
                    },
                    "userErrors": [],
                }}})
            }
            "WebhookSubscriptionCreate" => {
                let topic = str_var(vars, "topic").to_string();
                if !self.webhooks.insert(topic.clone()) {
                    return json!({"data": {"webhookSubscriptionCreate": {
                        "webhookSubscription": null,
                        "userErrors": [{"field": ["webhookSubscription", "callbackUrl"], "message": "Address for this topic has already been taken"}],
                    }}});
                }
                json!({"data": {"webhookSubscriptionCreate": {
                    "webhookSubscription": {"id": format!("gid://shopify/WebhookSubscription/{}", self.webhooks.len()), "topic": topic},
                    "userErrors": [],
                }}})
            }
            other => json!({"errors": [{"message": format!("unknown operation {other}")}]}),
        }
    }
}

async fn graphql(State(data): State<Arc<Mutex<MockData>>>, Json(request): Json<GraphQLRequest>) -> Json<Value> {
    Json(data.lock().unwrap().graphql(&request))
}

async fn access_token(
    State(data): State<Arc<Mutex<MockData>>>,
    axum::extract::Form(form): axum::extract::Form<HashMap<String, String>>,
) -> Json<Value> {
    data.lock().unwrap().token_requests.push(form);
    Json(json!({"access_token": MOCK_ACCESS_TOKEN, "scope": "write_products,read_products"}))
}

async fn menu_page(State(data): State<Arc<Mutex<MockData>>>) -> Response {
    let (status, body) = data.lock().unwrap().menu_page.clone();
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::OK);
    (status, [("content-type", "text/html")], body).into_response()
}

impl MockShopify {
    /// Start the mock on an ephemeral port.
    pub async fn spawn() -> Self {
        let data = Arc::new(Mutex::new(MockData {
            shop_id: Some(SHOP_GID.to_string()),
            menu_page: (200, String::new()),
            ..MockData::default()
        }));

        let router = Router::new()
            .route("/admin/api/{version}/graphql.json", post(graphql))
            .route("/admin/oauth/access_token", post(access_token))
            .route("/pages/menu", get(menu_page))
            .with_state(data.clone());

        let addr = serve(router).await;
        Self {
            url: format!("http://{addr}"),
            data,
        }
    }

    /// Set the shop id returned by `GetShopId`; `None` answers `null`.
    pub fn set_shop_id(&self, id: Option<&str>) {
        self.data.lock().unwrap().shop_id = id.map(String::from);
    }

    /// Store a raw shop metafield value, as if written from the admin.
    pub fn put_shop_metafield(&self, namespace: &str, key: &str, value: &str) {
        let mut data = self.data.lock().unwrap();
        let owner = data.shop_id.clone().unwrap_or_else(|| SHOP_GID.to_string());
        data.metafields
            .insert((owner, namespace.to_string(), key.to_string()), value.to_string());
    }

    /// Raw value stored for a metafield of `owner`.
    pub fn metafield(&self, owner: &str, namespace: &str, key: &str) -> Option<String> {
        self.data
            .lock()
            .unwrap()
            .metafields
            .get(&(owner.to_string(), namespace.to_string(), key.to_string()))
            .cloned()
    }

    /// Make a product known to `GetProductSpinSwipe`.
    pub fn add_product(&self, gid: &str) {
        self.data.lock().unwrap().products.insert(gid.to_string());
    }

    /// Number of times an operation was received.
    pub fn calls(&self, operation: &str) -> usize {
        self.data.lock().unwrap().calls.get(operation).copied().unwrap_or(0)
    }

    /// Metafield definitions created so far, as (namespace, key).
    pub fn definitions(&self) -> HashSet<(String, String)> {
        self.data.lock().unwrap().definitions.clone()
    }

    /// Webhook topics subscribed so far.
    pub fn webhook_topics(&self) -> HashSet<String> {
        self.data.lock().unwrap().webhooks.clone()
    }

    /// Form bodies received by the OAuth token endpoint.
    pub fn token_requests(&self) -> Vec<HashMap<String, String>> {
        self.data.lock().unwrap().token_requests.clone()
    }

    /// Set the status and HTML served at `/pages/menu`.
    pub fn set_menu_page(&self, status: u16, body: &str) {
        self.data.lock().unwrap().menu_page = (status, body.to_string());
    }
}

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

// =============================================================================
// App under test
// =============================================================================

/// The app router running against a [`MockShopify`].
pub struct TestApp {
    /// Base URL, without trailing slash.
    pub url: String,
    /// Client without redirects or cookies.
    pub client: reqwest::Client,
    pub shopify: MockShopify,
    pub sessions: Arc<MemorySessionStore>,
}

impl TestApp {
    /// Start a mock Shopify and the app pointed at it.
    pub async fn spawn() -> Self {
        let shopify = MockShopify::spawn().await;

        let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let url = format!("http://{addr}");

        let config = AppConfig {
            database_url: SecretString::from("postgres://unused"),
            host: addr.ip(),
            port: addr.port(),
            app_url: url.clone(),
            shopify: ShopifyAppConfig {
                api_key: API_KEY.to_string(),
                api_secret: SecretString::from(API_SECRET),
                scopes: vec!["write_products".to_string(), "read_products".to_string()],
                api_version: "2024-04".to_string(),
                custom_shop_domains: vec![],
                origin_override: Some(url::Url::parse(&shopify.url).unwrap()),
            },
            management_app_url: "https://shopify-management-app.vercel.app".to_string(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };

        let sessions = Arc::new(MemorySessionStore::new());
        let state = AppState::new(config, None, sessions.clone());
        let router = spin_swipe_app::app(state)
            .layer(SessionManagerLayer::new(MemoryStore::default()).with_secure(false));

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            url,
            client,
            shopify,
            sessions,
        }
    }

    /// Absolute URL for `path`.
    pub fn at(&self, path: &str) -> String {
        format!("{}{path}", self.url)
    }

    /// Store an offline session for `shop`, as a finished install would.
    pub async fn install(&self, shop: &str) -> ShopDomain {
        let shop = ShopDomain::parse(shop).unwrap();
        let session = ShopSession::offline(
            shop.clone(),
            SecretString::from(MOCK_ACCESS_TOKEN),
            "write_products,read_products".to_string(),
        );
        self.sessions.store(&session).await.unwrap();
        shop
    }

    /// A valid session token for `shop`.
    pub fn session_token(&self, shop: &str) -> String {
        let shop = ShopDomain::parse(shop).unwrap();
        let claims = session_token::claims_for(&shop, API_KEY, chrono::Utc::now().timestamp());
        session_token::sign(&claims, API_SECRET).unwrap()
    }

    /// Deliver a signed webhook.
    pub async fn webhook(&self, topic: &str, shop: &str, body: &Value) -> reqwest::Response {
        let body = serde_json::to_vec(body).unwrap();
        let signature = hmac::sign_webhook(&body, API_SECRET);
        self.client
            .post(self.at("/webhooks"))
            .header("content-type", "application/json")
            .header("x-shopify-hmac-sha256", signature)
            .header("x-shopify-topic", topic)
            .header("x-shopify-shop-domain", shop)
            .header("x-shopify-webhook-id", "b54557e4-bdd9-4b37-8a5f-bf7d70bcd043")
            .header("x-shopify-api-version", "2024-04")
            .body(body)
            .send()
            .await
            .unwrap()
    }

    /// Query string for an app proxy request, signed unless `signed` is false.
    pub fn proxy_query(&self, shop: &str, signed: bool) -> String {
        let mut params = vec![
            ("shop".to_string(), shop.to_string()),
            ("logged_in_customer_id".to_string(), String::new()),
            ("path_prefix".to_string(), "/apps/spinning-tool-selection".to_string()),
            ("timestamp".to_string(), chrono::Utc::now().timestamp().to_string()),
        ];
        let signature = if signed {
            hmac::sign_proxy_query(&params, API_SECRET)
        } else {
            "0".repeat(64)
        };
        params.push(("signature".to_string(), signature));

        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish()
    }
}
