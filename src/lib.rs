//! # SMA Landscape
//!
//! Treatment and referral analytics for the SMA drug portfolio
//! (Zolgensma, Spinraza, Evrysdi). Flat patient/HCP/HCO/referral records
//! are pulled from the data portal and turned into the view models of an
//! HCP/HCO landscape dashboard: distinct-count rollups, quantile-shaded
//! choropleths, account and referral maps, and tidy network trees.
//!
//! ## Features
//!
//! - **Lenient ingestion**: `NaN`, `"-"` and blanks all read as missing
//! - **Distinct counting**: patients, HCPs and HCOs counted once per group
//! - **Quantile shading**: palette buckets with legends and painted GeoJSON
//! - **Network trees**: account and referral hierarchies with node positions
//! - **Sessions**: login, remembered email, last page, per-session dataset cache
//!
//! ## Modules
//!
//! - [`record`]: Record model, sentinel handling and territories
//! - [`aggregate`]: Group-by / distinct-count engine
//! - [`scale`]: Palettes, quantile scales and boundary painting
//! - [`layout`]: Hierarchies and tidy-tree layout
//! - [`client`]: Record sources (portal API or local dump)
//! - [`session`]: Login, navigation state and dataset cache
//! - [`views`]: One view model per dashboard page
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sma_landscape::aggregate::{rollup, Entity, GroupBy};
//! use sma_landscape::record::load_records;
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let records = load_records(Path::new("records.json"))?;
//!
//!     // Distinct patients per rendering state
//!     for row in rollup(&records, GroupBy::State, Entity::Patient).iter() {
//!         println!("{}: {}", row.key, row.count);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod api;
pub mod client;
pub mod config;
pub mod layout;
pub mod record;
pub mod scale;
pub mod session;
pub mod views;

// Re-export top-level types for convenience
pub use record::{load_records, parse_records, GeoPoint, Record, RecordError, TerritoryMap, Tier};

pub use aggregate::{
    count_distinct, quarterly_trend, referral_pairs, rollup, rollup_with, tally_by, Entity,
    GroupBy, GroupCount, GroupCounts, GroupOrder, Totals,
};

pub use scale::{paint_boundaries, LegendBin, Palette, QuantileScale};

pub use layout::{account_tree, referral_tree, Hierarchy, LayoutConfig, ReferralEdge};

pub use client::{FileSource, PortalClient, PortalConfig, RecordSource, SourceError, SourceResult};

pub use session::{
    Credentials, DatasetCache, Filters, OrgRelationship, Page, Selection, SessionError,
    SessionStore, ViewState,
};

pub use views::{
    AccountMap, HcoDeepDive, HcoLandscape, HcpDeepDive, HcpLandscape, ReferralMap, StateMap,
    ViewError, ViewOptions,
};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{generate_default_config, Config, ConfigError, LoggingConfig};
