use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::admin::admin_router;
use super::catalog::{get_product, list_products};
use super::verify::verify_code;
use crate::cache::Cache;
use crate::catalog::Catalog;
use crate::codes::CodeService;
use crate::config::{CacheTtl, Config};
use crate::error::Result;
use crate::store::{SqliteStore, Store, StoreClient};

/// Shared handles for every request, built once at startup.
pub struct AppState {
    pub cache: Arc<Cache>,
    pub catalog: Catalog,
    pub codes: CodeService,
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(
        store: StoreClient,
        cache: Arc<Cache>,
        ttl: CacheTtl,
        admin_token: Option<String>,
    ) -> Self {
        let catalog = Catalog::new(store.clone(), Arc::clone(&cache), ttl);
        let codes = CodeService::new(store, catalog.clone());
        Self {
            cache,
            catalog,
            codes,
            admin_token,
        }
    }

    /// Opens the database, applies the schema and connects the configured cache.
    pub fn from_config(config: &Config) -> Result<Self> {
        if let Some(parent) = config.store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let store = SqliteStore::new(&config.store.path)?;
        store.initialize()?;
        let store = StoreClient::new(Arc::new(store), config.store.timeout());

        let cache = Cache::from_config(&config.cache)?;
        if cache.is_pass_through() {
            tracing::info!("No cache backend configured, reads go straight to the store");
        } else {
            tracing::info!(backend = cache.stats().backend, "Cache backend configured");
        }

        if config.admin_token.is_none() {
            tracing::warn!("No admin token configured, admin routes are disabled");
        }

        Ok(Self::new(
            store,
            Arc::new(cache),
            config.cache.ttl,
            config.admin_token.clone(),
        ))
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/{id}", get(get_product))
        .route("/api/v1/verify/{code}", get(verify_code))
        .nest("/api/v1/admin", admin_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
