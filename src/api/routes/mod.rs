//! API Routes
//!
//! Route handlers organized by functionality.

pub mod auth;
pub mod cache;
pub mod deep_dive;
pub mod health;
pub mod landscape;
pub mod maps;
pub mod session;

use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::record::Record;
use crate::session::{Dataset, Filters};

/// Check the login, load the dataset and apply the request's filters
///
/// The filters become the session's active filters.
pub(crate) async fn filtered(
    state: &AppState,
    filters: Filters,
) -> ApiResult<(Arc<Dataset>, Vec<Record>)> {
    state.require_login().await?;
    let dataset = state.dataset().await?;
    let records = filters.apply(&dataset.records, Some(&dataset.territories));

    tracing::debug!(
        total = dataset.records.len(),
        matched = records.len(),
        "Applied filters"
    );

    state.view.lock().await.filters = filters;
    Ok((dataset, records))
}
