//! Page View Models
//!
//! One serializable model per dashboard page, each a pure function of
//! already-filtered records plus [`ViewOptions`]:
//!
//! | Page            | Model            |
//! |-----------------|------------------|
//! | HCP landscape   | [`HcpLandscape`] |
//! | HCO landscape   | [`HcoLandscape`] |
//! | Account map     | [`AccountMap`]   |
//! | Referral map    | [`ReferralMap`]  |
//! | HCP deep dive   | [`HcpDeepDive`]  |
//! | HCO deep dive   | [`HcoDeepDive`]  |
//!
//! [`StateMap`] backs the choropleth layer shared by the map pages.

mod common;
mod deep_dive;
mod landscape;
mod maps;

pub use common::{
    color_counts, ColoredCount, ColoredTally, RegionLayer, ViewError, ViewOptions, ViewResult,
};
pub use deep_dive::{HcoDeepDive, HcoProfile, HcpDeepDive, HcpProfile, ReferringAccount};
pub use landscape::{
    ordered_rollup, top_hcos, top_hcps, HcoLandscape, HcoSummary, HcpLandscape, HcpSummary,
};
pub use maps::{AccountMap, AccountMarker, ReferralMap, ReferralMarker, StateMap};
