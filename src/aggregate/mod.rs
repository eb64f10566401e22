//! Aggregation
//!
//! Turns flat records into counts of distinct entities per group.
//!
//! ## Pipeline
//!
//! ```text
//! records → key selector (GroupBy) → id selector (Entity) → DistinctIndex → GroupCounts → order
//! ```
//!
//! - [`DistinctIndex`]: the de-duplication primitive (key → set of ids)
//! - [`count_distinct`]: pure function over any item type
//! - [`rollup`]: records grouped by a [`GroupBy`] dimension, counting an [`Entity`]
//! - [`tally_by`]: patients, HCPs and HCOs per key in one pass
//! - [`referral_pairs`]: organization-to-organization referral counts

mod distinct;
mod group;
mod referral;
mod tally;

pub use distinct::DistinctIndex;
pub use group::{
    count_distinct, quarterly_trend, rollup, rollup_with, Entity, GroupBy, GroupCount,
    GroupCounts, GroupOrder,
};
pub use referral::{referral_pairs, ReferralPair};
pub use tally::{tally_by, EntityTally, Totals};
