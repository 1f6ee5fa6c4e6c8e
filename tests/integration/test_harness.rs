//! Shared setup for integration tests: a mock backend, token builder and a
//! client wired to in-memory collaborators.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use mockito::{Mock, ServerGuard};
use serde_json::{json, Value};

use alacena::auth::CredentialStore;
use alacena::navigation::RecordingNavigator;
use alacena::{FixedClock, InventoryApi, MemoryStore, ReqwestHttpClient};

/// Reference time used by every integration test
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 21, 12, 0, 0).unwrap()
}

/// Unsigned token whose payload carries `exp`
pub fn token(exp: i64, sub: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({ "exp": exp, "sub": sub }).to_string());
    format!("{header}.{payload}.sig")
}

pub fn fresh_token(sub: &str) -> String {
    token(now().timestamp() + 3600, sub)
}

pub fn expired_token(sub: &str) -> String {
    token(now().timestamp() - 60, sub)
}

pub fn product_json(id: &str, name: &str, product_type: &str, expiration_date: &str) -> Value {
    json!({
        "name": name,
        "quantity": 2,
        "entry_date": "2025-08-01",
        "expiration_date": expiration_date,
        "type": product_type,
        "product_id": id,
        "image": ""
    })
}

/// Client under test with the collaborators it was built from
pub struct TestEnvironment<S: CredentialStore + 'static = MemoryStore> {
    pub server: ServerGuard,
    pub store: Arc<S>,
    pub navigator: Arc<RecordingNavigator>,
    pub api: InventoryApi<ReqwestHttpClient>,
}

impl TestEnvironment<MemoryStore> {
    pub async fn new() -> Self {
        Self::with_store(MemoryStore::new()).await
    }

    /// Client whose base URL carries a path prefix such as `/v1`
    pub async fn mounted_at(prefix: &str) -> Self {
        Self::build(MemoryStore::new(), prefix).await
    }
}

impl<S: CredentialStore + 'static> TestEnvironment<S> {
    pub async fn with_store(store: S) -> Self {
        Self::build(store, "").await
    }

    async fn build(store: S, prefix: &str) -> Self {
        let server = mockito::Server::new_async().await;
        let store = Arc::new(store);
        let navigator = Arc::new(RecordingNavigator::new());
        let api = InventoryApi::new(
            ReqwestHttpClient::new(),
            format!("{}{prefix}", server.url()),
            store.clone(),
            navigator.clone(),
        )
        .with_clock(Arc::new(FixedClock(now())));

        Self {
            server,
            store,
            navigator,
            api,
        }
    }

    /// Seed the store with a token pair
    pub async fn sign_in(&self, access: &str, refresh: &str) {
        self.store.set("access", access).await.unwrap();
        self.store.set("refresh", refresh).await.unwrap();
    }

    pub async fn stored(&self, key: &str) -> Option<String> {
        self.store.get(key).await.unwrap()
    }

    /// `GET /api/products/` answering with `products`, expected `hits` times
    pub async fn mock_products(&mut self, bearer: &str, products: Value, hits: usize) -> Mock {
        self.server
            .mock("GET", "/api/products/")
            .match_header("authorization", format!("Bearer {bearer}").as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "count": products.as_array().map_or(0, Vec::len), "results": products }).to_string())
            .expect(hits)
            .create_async()
            .await
    }

    /// `POST /api/token/refresh/` for `refresh`, answering with `status` and `body`
    pub async fn mock_refresh(&mut self, refresh: &str, status: usize, body: Value, hits: usize) -> Mock {
        self.server
            .mock("POST", "/api/token/refresh/")
            .match_body(mockito::Matcher::Json(json!({ "refresh": refresh })))
            .match_header("authorization", mockito::Matcher::Missing)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .expect(hits)
            .create_async()
            .await
    }
}
