mod cache;
mod codes;
mod labels;
mod products;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // Product routes
        .route("/products", post(products::create_product))
        .route(
            "/products/{id}",
            patch(products::update_product).delete(products::delete_product),
        )
        .route("/products/{id}/stock", put(products::set_stock))
        // Code routes
        .route(
            "/products/{id}/codes",
            post(codes::issue_codes).get(codes::list_product_codes),
        )
        .route("/codes/expire", post(codes::expire_codes))
        .route("/codes/{code}", get(codes::get_code).delete(codes::delete_code))
        .route("/codes/{code}/status", put(codes::set_status))
        // Label routes
        .route("/labels", post(labels::issue_label).get(labels::list_labels))
        .route(
            "/labels/{code}",
            get(labels::get_label).patch(labels::update_label),
        )
        // Cache
        .route("/cache/stats", get(cache::cache_stats))
}
