//! Map Routes
//!
//! - GET /api/v1/map/accounts - Account markers and ZIP shading, optionally painted GeoJSON
//! - GET /api/v1/map/referrals - Referral pairs and referring-org markers
//! - GET /api/v1/map/states - State choropleth, optionally painted GeoJSON

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::aggregate::Entity;
use crate::api::dto::MapParams;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::client::fetch_boundaries;
use crate::session::Filters;
use crate::views::{AccountMap, ReferralMap, StateMap};

use super::filtered;

/// GET /api/v1/map/accounts
///
/// `?geojson=true` also paints the configured ZIP boundaries.
pub async fn account_map(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<Filters>,
    Query(params): Query<MapParams>,
) -> ApiResult<Json<AccountMap>> {
    let (_, records) = filtered(&state, filters).await?;
    let map = AccountMap::build(&records, &state.options);

    if !params.geojson {
        return Ok(Json(map));
    }

    let location = state
        .config
        .zips_url
        .as_deref()
        .ok_or_else(|| ApiError::Validation("No ZIP boundaries configured".to_string()))?;
    let geojson = fetch_boundaries(&state.http, location).await?;

    Ok(Json(map.with_zip_boundaries(geojson, &state.options)))
}

/// GET /api/v1/map/referrals
pub async fn referral_map(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<Filters>,
) -> ApiResult<Json<ReferralMap>> {
    let (_, records) = filtered(&state, filters).await?;
    Ok(Json(ReferralMap::build(&records, &state.options)))
}

/// GET /api/v1/map/states
///
/// `?shaded_by=hcps` picks what the shading counts (patients by default).
/// `?geojson=true` fetches the configured boundaries and paints them.
pub async fn state_map(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<Filters>,
    Query(params): Query<MapParams>,
) -> ApiResult<Json<StateMap>> {
    let shaded_by = match params.shaded_by.as_deref() {
        Some(s) => s.parse::<Entity>().map_err(ApiError::Validation)?,
        None => Entity::Patient,
    };

    let (dataset, records) = filtered(&state, filters).await?;
    let map = StateMap::build(&records, Some(&dataset.territories), shaded_by, &state.options);

    if !params.geojson {
        return Ok(Json(map));
    }

    let location = state
        .config
        .states_url
        .as_deref()
        .ok_or_else(|| ApiError::Validation("No state boundaries configured".to_string()))?;
    let geojson = fetch_boundaries(&state.http, location).await?;

    Ok(Json(map.with_boundaries(geojson, &state.options)))
}
