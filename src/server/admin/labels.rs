use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::products::not_found_as;
use crate::auth::RequireAdmin;
use crate::codes::{LabelPatch, NewLabel};
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse};

pub async fn issue_label(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewLabel>,
) -> impl IntoResponse {
    let label = state
        .codes
        .issue_label(req)
        .await
        .map_err(|e| not_found_as(e, "Product not found"))?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(label))))
}

pub async fn list_labels(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let labels = state.codes.list_labels().await?;

    Ok::<_, ApiError>(Json(ApiResponse::success(labels)))
}

pub async fn get_label(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> impl IntoResponse {
    let label = state
        .codes
        .get_label(&code)
        .await
        .map_err(|e| not_found_as(e, "Label not found"))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(label)))
}

pub async fn update_label(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Json(req): Json<LabelPatch>,
) -> impl IntoResponse {
    let label = state
        .codes
        .update_label(&code, req)
        .await
        .map_err(|e| not_found_as(e, "Label not found"))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(label)))
}
