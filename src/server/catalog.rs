//! Public catalog reads. A transient store failure answers 503 with an empty
//! `data` value rather than a bare error.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::{Value, json};

use crate::server::AppState;
use crate::server::dto::ProductListParams;
use crate::server::response::{ApiError, ApiResponse};

pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProductListParams>,
) -> impl IntoResponse {
    let products = match params.collection.as_deref().filter(|c| !c.is_empty()) {
        Some(collection) => state.catalog.products_by_collection(collection).await,
        None => state.catalog.all_products().await,
    }
    .map_err(|e| degrade(e, json!([])))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(products)))
}

pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let product = state
        .catalog
        .product_by_id(&id)
        .await
        .map_err(|e| degrade(e, Value::Null))?;

    Ok::<_, ApiError>(Json(ApiResponse {
        data: product,
        error: None,
    }))
}

fn degrade(err: crate::error::Error, empty: Value) -> ApiError {
    ApiError::from(err).with_data(empty)
}
