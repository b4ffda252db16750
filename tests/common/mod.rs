#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use storefront::cache::{Cache, MemoryBackend};
use storefront::config::CacheTtl;
use storefront::server::{AppState, create_router};
use storefront::store::{SqliteStore, Store, StoreClient};

pub const ADMIN_TOKEN: &str = "test-admin-token";

pub struct TestApp {
    pub state: Arc<AppState>,
    router: Router,
}

impl TestApp {
    /// In-memory store, memory cache and the test admin token.
    pub fn new() -> Self {
        let store = SqliteStore::in_memory().expect("open in-memory store");
        store.initialize().expect("apply schema");
        Self::with_store(Arc::new(store), Duration::from_secs(5), Some(ADMIN_TOKEN))
    }

    pub fn with_store(store: Arc<dyn Store>, timeout: Duration, admin_token: Option<&str>) -> Self {
        let cache = Cache::new(Arc::new(MemoryBackend::default()), Duration::from_millis(250));
        let state = Arc::new(AppState::new(
            StoreClient::new(store, timeout),
            Arc::new(cache),
            CacheTtl::default(),
            admin_token.map(str::to_string),
        ));
        let router = create_router(Arc::clone(&state));
        Self { state, router }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.request(method, uri, Some(ADMIN_TOKEN), body).await
    }

    /// Creates a product through the admin API and returns its id.
    pub async fn create_product(&self, name: &str, collection: &str) -> String {
        let (status, body) = self
            .admin(
                Method::POST,
                "/api/v1/admin/products",
                Some(serde_json::json!({
                    "name": name,
                    "collection": collection,
                    "price": 250000,
                    "stock": 5,
                    "sizes": ["M", "L"],
                    "purchase_links": [
                        {"platform": "Shopee", "url": "https://shopee.example/veil"},
                        {"platform": "TikTok Shop", "url": "https://tiktok.example/veil"}
                    ],
                    "images": ["front.png", "back.png"]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create product: {body}");
        body["data"]["id"].as_str().expect("product id").to_string()
    }
}
