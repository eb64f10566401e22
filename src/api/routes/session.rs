//! Session Routes
//!
//! - GET /api/v1/session - Login state, page, filters and selection
//! - PUT /api/v1/session/page - Switch pages
//! - POST /api/v1/session/back - Leave a deep dive

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{PageRequest, SessionResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::session::Page;

/// GET /api/v1/session
pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionResponse> {
    let session = state.session.lock().await;
    let view = state.view.lock().await;
    let cached = state.cache.is_cached().await;
    Json(SessionResponse::new(session.data(), &view, cached))
}

/// PUT /api/v1/session/page
///
/// Clears the selection and remembers the page for the next login. Deep
/// dives need a selection and open through their own routes.
pub async fn set_page(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PageRequest>,
) -> ApiResult<Json<SessionResponse>> {
    state.require_login().await?;

    let page: Page = request.page.parse().map_err(ApiError::Validation)?;
    if page.is_deep_dive() {
        return Err(ApiError::Validation(format!(
            "{} opens through /hcp/:name or /hco/:mdm",
            page
        )));
    }

    let mut session = state.session.lock().await;
    session.set_last_page(page)?;

    let mut view = state.view.lock().await;
    view.navigate(page);
    tracing::debug!(page = %page, "Navigated");

    let cached = state.cache.is_cached().await;
    Ok(Json(SessionResponse::new(session.data(), &view, cached)))
}

/// POST /api/v1/session/back
pub async fn back(State(state): State<Arc<AppState>>) -> ApiResult<Json<SessionResponse>> {
    state.require_login().await?;

    let mut session = state.session.lock().await;
    let mut view = state.view.lock().await;
    let page = view.back();
    session.set_last_page(page)?;

    let cached = state.cache.is_cached().await;
    Ok(Json(SessionResponse::new(session.data(), &view, cached)))
}
