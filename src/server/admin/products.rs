use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::catalog::{NewProduct, ProductPatch};
use crate::server::AppState;
use crate::server::dto::{DeletedResponse, SetStockRequest};
use crate::server::response::{ApiError, ApiResponse};

pub async fn create_product(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewProduct>,
) -> impl IntoResponse {
    let product = state.catalog.create_product(req).await?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(product))))
}

pub async fn update_product(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ProductPatch>,
) -> impl IntoResponse {
    let product = state
        .catalog
        .update_product(&id, req)
        .await
        .map_err(|e| not_found_as(e, "Product not found"))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(product)))
}

pub async fn set_stock(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SetStockRequest>,
) -> impl IntoResponse {
    let product = state
        .catalog
        .set_stock(&id, req.stock)
        .await
        .map_err(|e| not_found_as(e, "Product not found"))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(product)))
}

pub async fn delete_product(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if !state.catalog.delete_product(&id).await? {
        return Err(ApiError::not_found("Product not found"));
    }

    Ok(Json(ApiResponse::success(DeletedResponse { deleted: true })))
}

pub(super) fn not_found_as(err: crate::error::Error, message: &'static str) -> ApiError {
    match err {
        crate::error::Error::NotFound => ApiError::not_found(message),
        err => err.into(),
    }
}
