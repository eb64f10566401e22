//! Landscape Routes
//!
//! - GET /api/v1/landscape/hcp - HCP overview
//! - GET /api/v1/landscape/hco - HCO overview
//!
//! Both accept the filter query params `state`, `year`, `territory`,
//! `specialty` and `relationship`.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::session::Filters;
use crate::views::{HcoLandscape, HcpLandscape};

use super::filtered;

/// GET /api/v1/landscape/hcp
pub async fn hcp_landscape(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<Filters>,
) -> ApiResult<Json<HcpLandscape>> {
    let (dataset, records) = filtered(&state, filters).await?;
    Ok(Json(HcpLandscape::build(
        &records,
        Some(&dataset.territories),
        &state.options,
    )))
}

/// GET /api/v1/landscape/hco
pub async fn hco_landscape(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<Filters>,
) -> ApiResult<Json<HcoLandscape>> {
    let (dataset, records) = filtered(&state, filters).await?;
    Ok(Json(HcoLandscape::build(
        &records,
        Some(&dataset.territories),
        &state.options,
    )))
}
