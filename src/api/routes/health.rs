//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (ready to serve traffic)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Kubernetes liveness probe.
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Kubernetes readiness probe.
/// The session store must be writable; the portal is not contacted.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    match check_session_health(&state).await {
        true => StatusCode::OK,
        false => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// GET /health
///
/// Full health status with component details.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let session_ok = check_session_health(&state).await;
    let logged_in = state.session.lock().await.is_logged_in();
    let dataset = state.cache.cached().await;

    let status = if session_ok { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        source: state.source.name().to_string(),
        dataset: if dataset.is_some() { "cached" } else { "empty" }.to_string(),
        records: dataset.map(|d| d.records.len()).unwrap_or(0),
        logged_in,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// A pending session write means the last persist failed
async fn check_session_health(state: &AppState) -> bool {
    let session = state.session.lock().await;
    !(session.is_persistent() && session.is_dirty())
}
