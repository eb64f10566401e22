//! Deep Dive Routes
//!
//! - GET /api/v1/hcp/:name - One prescriber in detail
//! - GET /api/v1/hco/:mdm - One organization in detail
//!
//! Deep dives fetch their own slice of records from the source rather than
//! reading the session dataset. Opening one selects the HCP or HCO and moves
//! the session onto the matching deep-dive page.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::record::Record;
use crate::session::{Filters, Selection};
use crate::views::{HcoDeepDive, HcpDeepDive};

/// GET /api/v1/hcp/:name
pub async fn hcp_deep_dive(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(filters): Query<Filters>,
) -> ApiResult<Json<HcpDeepDive>> {
    state.require_login().await?;

    let records = state.source.fetch_hcp_360(&name).await?;
    let records = apply_filters(&state, &filters, records).await;
    let view = HcpDeepDive::build(&records, &name, &state.options)?;

    open(&state, filters, Selection::Hcp(name)).await?;
    Ok(Json(view))
}

/// GET /api/v1/hco/:mdm
pub async fn hco_deep_dive(
    State(state): State<Arc<AppState>>,
    Path(mdm): Path<String>,
    Query(filters): Query<Filters>,
) -> ApiResult<Json<HcoDeepDive>> {
    state.require_login().await?;

    let records = state.source.fetch_hco_360(&mdm).await?;
    let records = apply_filters(&state, &filters, records).await;
    let view = HcoDeepDive::build(&records, &mdm, &state.options)?;

    open(&state, filters, Selection::Hco(mdm)).await?;
    Ok(Json(view))
}

/// Territory filters need the session's territory map, when one was fetched
async fn apply_filters(state: &AppState, filters: &Filters, records: Vec<Record>) -> Vec<Record> {
    if filters.is_empty() {
        return records;
    }
    let dataset = state.cache.cached().await;
    filters.apply(&records, dataset.as_ref().map(|d| &d.territories))
}

async fn open(state: &AppState, filters: Filters, selection: Selection) -> ApiResult<()> {
    let mut view = state.view.lock().await;
    view.filters = filters;
    view.select(selection);
    let page = view.drill_down()?;

    tracing::debug!(page = %page, "Opened deep dive");
    Ok(())
}
