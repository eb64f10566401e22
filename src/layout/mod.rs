//! Referral Hierarchy Layout
//!
//! Builds fixed-depth referral trees from flat relationships and lays them
//! out in columns, ready to draw as nodes and curved links.
//!
//! - [`account_tree`]: root → archetype → tier → account
//! - [`referral_tree`]: root → referred HCP → affiliated account
//! - [`Hierarchy::layout`]: positions, radii and link paths

mod position;
mod tree;

pub use position::{link_path, LayoutConfig};
pub use tree::{
    account_tree, referral_tree, Hierarchy, Link, Node, NodeKind, ReferralEdge,
    UNASSIGNED_ARCHETYPE, UNTIERED,
};
