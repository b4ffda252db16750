use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};

use crate::codes::Verification;
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse};

const INVALID_CODE: &str = "invalid or inactive code";

/// Public scan endpoint. Counts the scan when the code can be shown.
///
/// A verified code is returned tagged with `"result": "verified"`; inactive
/// and unknown codes are both a 404.
pub async fn verify_code(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<Verification>>, ApiError> {
    match state.codes.resolve_code(&code).await? {
        verified @ Verification::Verified(_) => Ok(Json(ApiResponse::success(verified))),
        Verification::Inactive | Verification::NotFound => Err(ApiError::not_found(INVALID_CODE)),
    }
}
