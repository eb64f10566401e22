//! Cache Routes
//!
//! - POST /api/v1/cache/refresh - Drop the dataset so the next request refetches

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::RefreshResponse;
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// POST /api/v1/cache/refresh
pub async fn refresh(State(state): State<Arc<AppState>>) -> ApiResult<Json<RefreshResponse>> {
    state.require_login().await?;

    let cleared = state.cache.is_cached().await;
    state.cache.clear().await;

    tracing::info!(cleared, "Dataset cache refreshed");
    Ok(Json(RefreshResponse { cleared }))
}
