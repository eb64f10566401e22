//! Grouping dimensions, countable entities and ordered group counts

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::record::{Record, Segment, TerritoryMap, Tier};

use super::distinct::DistinctIndex;

/// Dimension a rollup groups records by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// Rendering organization state (two-letter code)
    State,
    /// Prescriber state (two-letter code)
    HcpState,
    /// Rendering organization ZIP (five digits)
    Zip,
    /// HCO tier, rendered as `"Tier N"`
    Tier,
    /// HCP segment label
    Segment,
    Specialty,
    /// Account archetype, falling back to the HCO grouping
    Archetype,
    Drug,
    Year,
    /// Year and quarter, `"2024-Q1"`
    Period,
    AgeGroup,
    /// Sales territory (needs a territory map)
    Territory,
    /// Referring HCP → rendering HCP
    Referral,
}

impl GroupBy {
    /// Extract the grouping key for a record
    pub fn key(&self, record: &Record, territories: Option<&TerritoryMap>) -> Option<String> {
        match self {
            GroupBy::State => record.hco_state_code().map(str::to_string),
            GroupBy::HcpState => record.hcp_state_code().map(str::to_string),
            GroupBy::Zip => record.hco_zip5(),
            GroupBy::Tier => record.tier().map(|t| t.to_string()),
            GroupBy::Segment => record.segment().map(|s| s.label().to_string()),
            GroupBy::Specialty => record.hcp_specialty.clone(),
            GroupBy::Archetype => record
                .account_archetype
                .clone()
                .or_else(|| record.hco_grouping.clone()),
            GroupBy::Drug => record.drug().map(|d| d.name().to_string()),
            GroupBy::Year => record.year.map(|y| y.to_string()),
            GroupBy::Period => record.period().map(|p| p.to_string()),
            GroupBy::AgeGroup => record.age_group.clone(),
            GroupBy::Territory => territories
                .and_then(|map| map.territory_of_record(record))
                .map(str::to_string),
            GroupBy::Referral => {
                let referring = record.ref_hcp_name.as_ref().or(record.ref_hcp_id.as_ref())?;
                let rendering = record.hcp_name.as_ref().or(record.hcp_id.as_ref())?;
                Some(format!("{} -> {}", referring, rendering))
            }
        }
    }

    /// The ordering a table of this dimension is normally shown in
    pub fn natural_order(&self) -> GroupOrder {
        match self {
            GroupBy::Tier => GroupOrder::TierAsc,
            GroupBy::Segment => GroupOrder::SegmentRank,
            GroupBy::Year | GroupBy::Period => GroupOrder::KeyAsc,
            _ => GroupOrder::CountDesc,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GroupBy::State => "state",
            GroupBy::HcpState => "hcp_state",
            GroupBy::Zip => "zip",
            GroupBy::Tier => "tier",
            GroupBy::Segment => "segment",
            GroupBy::Specialty => "specialty",
            GroupBy::Archetype => "archetype",
            GroupBy::Drug => "drug",
            GroupBy::Year => "year",
            GroupBy::Period => "period",
            GroupBy::AgeGroup => "age_group",
            GroupBy::Territory => "territory",
            GroupBy::Referral => "referral",
        }
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "state" => Ok(GroupBy::State),
            "hcp_state" => Ok(GroupBy::HcpState),
            "zip" => Ok(GroupBy::Zip),
            "tier" => Ok(GroupBy::Tier),
            "segment" => Ok(GroupBy::Segment),
            "specialty" => Ok(GroupBy::Specialty),
            "archetype" | "grouping" => Ok(GroupBy::Archetype),
            "drug" => Ok(GroupBy::Drug),
            "year" => Ok(GroupBy::Year),
            "period" | "quarter" => Ok(GroupBy::Period),
            "age_group" | "age" => Ok(GroupBy::AgeGroup),
            "territory" => Ok(GroupBy::Territory),
            "referral" => Ok(GroupBy::Referral),
            _ => Err(format!("Unknown grouping: {}", s)),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The kind of entity whose distinct ids are counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Patient,
    Hcp,
    Hco,
}

impl Entity {
    /// Identifier of this entity on a record
    ///
    /// HCPs fall back to their name when the id column is absent.
    pub fn id_of<'a>(&self, record: &'a Record) -> Option<&'a str> {
        match self {
            Entity::Patient => record.patient_id.as_deref(),
            Entity::Hcp => record.hcp_id.as_deref().or(record.hcp_name.as_deref()),
            Entity::Hco => record.hco_mdm.as_deref(),
        }
    }
}

impl FromStr for Entity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "patient" | "patients" => Ok(Entity::Patient),
            "hcp" | "hcps" => Ok(Entity::Hcp),
            "hco" | "hcos" | "account" | "accounts" => Ok(Entity::Hco),
            _ => Err(format!("Unknown entity: {}", s)),
        }
    }
}

/// How a table of group counts is ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupOrder {
    /// Descending count, ties by key
    CountDesc,
    KeyAsc,
    /// Tier number ascending; unparseable tiers last
    TierAsc,
    /// High > Moderate > Low > Very Low; unknown segments last
    SegmentRank,
}

/// Distinct count for one group key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub key: String,
    pub count: usize,
}

impl GroupCount {
    pub fn new(key: impl Into<String>, count: usize) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }
}

/// An ordered table of group counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GroupCounts(Vec<GroupCount>);

impl From<Vec<GroupCount>> for GroupCounts {
    fn from(counts: Vec<GroupCount>) -> Self {
        Self(counts)
    }
}

impl GroupCounts {
    /// Count for a key, if the key is present
    pub fn get(&self, key: &str) -> Option<usize> {
        self.0.iter().find(|c| c.key == key).map(|c| c.count)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GroupCount> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reorder the table
    pub fn ordered(mut self, order: GroupOrder) -> Self {
        match order {
            GroupOrder::CountDesc => self
                .0
                .sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key))),
            GroupOrder::KeyAsc => self.0.sort_by(|a, b| a.key.cmp(&b.key)),
            GroupOrder::TierAsc => self.0.sort_by_key(|c| {
                let tier = Tier::parse(&c.key);
                (tier.is_none(), tier, c.key.clone())
            }),
            GroupOrder::SegmentRank => self.0.sort_by_key(|c| {
                let rank = c.key.parse::<Segment>().map(|s| s.rank()).unwrap_or(u8::MAX);
                (rank, c.key.clone())
            }),
        }
        self
    }

    /// Keep the first `n` rows
    pub fn top(mut self, n: usize) -> Self {
        self.0.truncate(n);
        self
    }

    /// Counts as floats, for fitting a color scale
    pub fn values(&self) -> Vec<f64> {
        self.0.iter().map(|c| c.count as f64).collect()
    }

    pub fn to_map(&self) -> BTreeMap<String, usize> {
        self.0.iter().map(|c| (c.key.clone(), c.count)).collect()
    }

    pub fn into_vec(self) -> Vec<GroupCount> {
        self.0
    }
}

/// Count distinct ids per group key
///
/// Items whose key or id is absent contribute nothing. The result is in key
/// order; reorder with [`GroupCounts::ordered`].
pub fn count_distinct<'a, T, F, G, K, V>(items: &'a [T], key_fn: F, id_fn: G) -> GroupCounts
where
    F: Fn(&'a T) -> Option<K>,
    G: Fn(&'a T) -> Option<V>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut index = DistinctIndex::new();
    for item in items {
        if let (Some(key), Some(id)) = (key_fn(item), id_fn(item)) {
            index.add(key.as_ref(), id.as_ref());
        }
    }
    index.counts()
}

/// Distinct `entity` count per `group`, in the dimension's natural order
pub fn rollup(records: &[Record], group: GroupBy, entity: Entity) -> GroupCounts {
    rollup_with(records, group, entity, None)
}

/// [`rollup`] with a territory map for [`GroupBy::Territory`]
pub fn rollup_with(
    records: &[Record],
    group: GroupBy,
    entity: Entity,
    territories: Option<&TerritoryMap>,
) -> GroupCounts {
    count_distinct(
        records,
        |r| group.key(r, territories),
        |r| entity.id_of(r),
    )
    .ordered(group.natural_order())
}

/// Distinct `entity` count per year-quarter, oldest first
pub fn quarterly_trend(records: &[Record], entity: Entity) -> GroupCounts {
    rollup(records, GroupBy::Period, entity)
}
