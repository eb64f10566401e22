//! Auth Routes
//!
//! - POST /api/v1/login - Check credentials and start a session
//! - POST /api/v1/logout - End the session and drop the dataset

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::{LoginRequest, SessionResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::session::ViewState;

/// POST /api/v1/login
///
/// Returns the new session, or 401 when the credentials do not match.
/// The view opens on the page the user last visited.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let mut session = state.session.lock().await;
    session.login(
        &state.credentials,
        &request.email,
        &request.password,
        request.remember,
    )?;

    let mut view = state.view.lock().await;
    *view = ViewState::new(session.data().last_page.unwrap_or_default());

    let cached = state.cache.is_cached().await;
    Ok(Json(SessionResponse::new(session.data(), &view, cached)))
}

/// POST /api/v1/logout
pub async fn logout(State(state): State<Arc<AppState>>) -> ApiResult<StatusCode> {
    state.session.lock().await.logout()?;
    state.cache.clear().await;

    let mut view = state.view.lock().await;
    let page = view.page;
    *view = ViewState::new(page);

    tracing::info!("Logged out");
    Ok(StatusCode::NO_CONTENT)
}
