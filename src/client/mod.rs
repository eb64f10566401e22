//! Record Sources
//!
//! Where records come from. The dashboard talks to the portal over plain
//! HTTP GET + JSON; the CLI can also run against a local JSON dump.
//!
//! ## Endpoints consumed
//!
//! - bulk dataset ("fetch all records")
//! - HCP 360, keyed by HCP name
//! - HCO 360, keyed by MDM id
//! - ZIP → territory mapping
//! - GeoJSON state/ZIP boundaries (public CDN or local file)
//!
//! Nothing is retried: a failed fetch is reported to the caller as a
//! [`SourceError`] and the view shows the message.

mod boundaries;
mod file;
mod portal;

pub use boundaries::fetch_boundaries;
pub use file::FileSource;
pub use portal::{PortalClient, PortalConfig};

use async_trait::async_trait;
use thiserror::Error;

use crate::record::{Record, RecordError, TerritoryMap};

/// Common interface for every record source
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// The full dataset
    async fn fetch_all(&self) -> SourceResult<Vec<Record>>;

    /// Records mentioning an HCP (rendering or referring), by name
    async fn fetch_hcp_360(&self, name: &str) -> SourceResult<Vec<Record>>;

    /// Records mentioning an HCO (rendering or referring), by MDM id
    async fn fetch_hco_360(&self, mdm: &str) -> SourceResult<Vec<Record>>;

    /// ZIP → territory assignment
    async fn fetch_territories(&self) -> SourceResult<TerritoryMap>;
}

/// Errors fetching records
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Portal unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid payload: {0}")]
    Parse(#[from] RecordError),

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

/// Result type alias for record sources
pub type SourceResult<T> = Result<T, SourceError>;

impl SourceError {
    /// Classify a transport error the way the dashboard reports it
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SourceError::Timeout
        } else if e.is_connect() {
            SourceError::Unavailable
        } else {
            SourceError::Request(e)
        }
    }
}
