//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Filters, Page, Selection, SessionData, ViewState};

// ============================================
// SESSION DTOs
// ============================================

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Remember the email for the next visit
    #[serde(default)]
    pub remember: bool,
}

/// Current session, as the dashboard shell sees it
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remembered_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logged_in_at: Option<DateTime<Utc>>,
    /// Active page
    pub page: Page,
    /// Filters of the last data request
    pub filters: Filters,
    pub selection: Selection,
    /// Page a deep dive was opened from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<Page>,
    /// Whether the dataset has been fetched this session
    pub cached: bool,
}

impl SessionResponse {
    pub fn new(data: &SessionData, view: &ViewState, cached: bool) -> Self {
        Self {
            logged_in: data.logged_in,
            remembered_email: data.remembered_email.clone(),
            logged_in_at: data.logged_in_at,
            page: view.page,
            filters: view.filters.clone(),
            selection: view.selection.clone(),
            previous: view.previous,
            cached,
        }
    }
}

/// Page change request
#[derive(Debug, Deserialize)]
pub struct PageRequest {
    /// Page name, e.g. `"hco_landscape"` or `"Referral Map"`
    pub page: String,
}

// ============================================
// MAP DTOs
// ============================================

/// Query params of the map pages, next to the filters
#[derive(Debug, Default, Deserialize)]
pub struct MapParams {
    /// Paint the configured boundary file
    #[serde(default)]
    pub geojson: bool,
    /// `patients`, `hcps` or `hcos`; state map only
    #[serde(default)]
    pub shaded_by: Option<String>,
}

// ============================================
// CACHE DTOs
// ============================================

/// Cache refresh response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// Whether a dataset was dropped
    pub cleared: bool,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy, degraded, unhealthy
    pub status: String,
    /// Record source name
    pub source: String,
    /// Dataset status: cached or empty
    pub dataset: String,
    /// Records in the cached dataset
    pub records: usize,
    pub logged_in: bool,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}
