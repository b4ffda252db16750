use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::products::not_found_as;
use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::{
    DeletedResponse, ExpireCodesRequest, ExpireCodesResponse, IssueCodesRequest, SetStatusRequest,
};
use crate::server::response::{ApiError, ApiResponse};
use crate::types::CodeStatus;

pub async fn issue_codes(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
    Json(req): Json<IssueCodesRequest>,
) -> impl IntoResponse {
    let codes = state
        .codes
        .issue_codes(&product_id, req.quantity)
        .await
        .map_err(|e| not_found_as(e, "Product not found"))?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(codes))))
}

pub async fn list_product_codes(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> impl IntoResponse {
    let codes = state.codes.list_product_codes(&product_id).await?;

    Ok::<_, ApiError>(Json(ApiResponse::success(codes)))
}

pub async fn get_code(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> impl IntoResponse {
    let code = state
        .codes
        .get_code(&code)
        .await
        .map_err(|e| not_found_as(e, "Code not found"))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(code)))
}

/// `active` resets the code; `used` and `expired` are lifecycle transitions.
pub async fn set_status(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Json(req): Json<SetStatusRequest>,
) -> impl IntoResponse {
    let updated = match req.status {
        CodeStatus::Active => state.codes.reset_code(&code).await,
        next => state.codes.set_code_status(&code, next).await,
    }
    .map_err(|e| not_found_as(e, "Code not found"))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(updated)))
}

pub async fn expire_codes(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExpireCodesRequest>,
) -> impl IntoResponse {
    let expired = state
        .codes
        .expire_codes_created_before(req.created_before)
        .await?;

    Ok::<_, ApiError>(Json(ApiResponse::success(ExpireCodesResponse { expired })))
}

pub async fn delete_code(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> impl IntoResponse {
    if !state.codes.delete_code(&code).await? {
        return Err(ApiError::not_found("Code not found"));
    }

    Ok(Json(ApiResponse::success(DeletedResponse { deleted: true })))
}
