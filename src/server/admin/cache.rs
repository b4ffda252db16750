use std::sync::Arc;

use axum::{Json, extract::State};

use crate::auth::RequireAdmin;
use crate::cache::CacheStats;
use crate::server::AppState;
use crate::server::response::ApiResponse;

pub async fn cache_stats(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<CacheStats>> {
    Json(ApiResponse::success(state.cache.stats()))
}
