//! HCP and HCO landscape pages

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::aggregate::{
    rollup, tally_by, Entity, EntityTally, GroupBy, GroupCounts, GroupOrder, Totals,
};
use crate::record::{Record, TerritoryMap, Tier};

use super::common::{accumulate_orgs, RegionLayer, ViewOptions};

/// Prescriber row of the top-HCP table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HcpSummary {
    pub name: String,
    pub specialty: Option<String>,
    pub segment: Option<String>,
    pub state: Option<String>,
    pub patients: usize,
}

/// Prescriber landscape
#[derive(Debug, Clone, Serialize)]
pub struct HcpLandscape {
    pub totals: Totals,
    /// Prescriber states, shaded by patients
    pub states: RegionLayer,
    /// HCPs per segment, High first
    pub segments: GroupCounts,
    /// HCPs per specialty
    pub specialties: GroupCounts,
    /// Patients per drug
    pub drugs: GroupCounts,
    pub top_hcps: Vec<HcpSummary>,
}

impl HcpLandscape {
    pub fn build(
        records: &[Record],
        territories: Option<&TerritoryMap>,
        options: &ViewOptions,
    ) -> Self {
        Self {
            totals: Totals::of(records),
            states: RegionLayer::build(
                records,
                GroupBy::HcpState,
                territories,
                Entity::Patient,
                &options.palette,
            ),
            segments: rollup(records, GroupBy::Segment, Entity::Hcp),
            specialties: rollup(records, GroupBy::Specialty, Entity::Hcp).top(options.top_n),
            drugs: rollup(records, GroupBy::Drug, Entity::Patient),
            top_hcps: top_hcps(records, options.top_n),
        }
    }
}

#[derive(Default)]
struct HcpAccumulator {
    name: Option<String>,
    specialty: Option<String>,
    segment: Option<String>,
    state: Option<String>,
    patients: HashSet<String>,
}

/// HCPs ranked by distinct patients, ties by name
pub fn top_hcps(records: &[Record], n: usize) -> Vec<HcpSummary> {
    let mut hcps: BTreeMap<&str, HcpAccumulator> = BTreeMap::new();
    for record in records {
        let Some(id) = Entity::Hcp.id_of(record) else {
            continue;
        };
        let acc = hcps.entry(id).or_default();
        if acc.name.is_none() {
            acc.name = record.hcp_name.clone();
        }
        if acc.specialty.is_none() {
            acc.specialty = record.hcp_specialty.clone();
        }
        if acc.segment.is_none() {
            acc.segment = record.segment().map(|s| s.label().to_string());
        }
        if acc.state.is_none() {
            acc.state = record.hcp_state_code().map(str::to_string);
        }
        if let Some(patient) = &record.patient_id {
            acc.patients.insert(patient.clone());
        }
    }

    let mut rows: Vec<HcpSummary> = hcps
        .into_iter()
        .map(|(id, acc)| HcpSummary {
            name: acc.name.unwrap_or_else(|| id.to_string()),
            specialty: acc.specialty,
            segment: acc.segment,
            state: acc.state,
            patients: acc.patients.len(),
        })
        .collect();
    rows.sort_by(|a, b| b.patients.cmp(&a.patients).then_with(|| a.name.cmp(&b.name)));
    rows.truncate(n);
    rows
}

/// Account row of the top-HCO table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HcoSummary {
    pub mdm: String,
    pub name: Option<String>,
    pub tier: Option<String>,
    pub archetype: Option<String>,
    pub state: Option<String>,
    pub patients: usize,
    pub hcps: usize,
}

/// Account landscape
#[derive(Debug, Clone, Serialize)]
pub struct HcoLandscape {
    pub totals: Totals,
    /// Account states, shaded by HCO count
    pub states: RegionLayer,
    /// Tallies per tier, Tier 1 first
    pub tiers: Vec<EntityTally>,
    /// Tallies per archetype, most accounts first
    pub archetypes: Vec<EntityTally>,
    pub top_hcos: Vec<HcoSummary>,
}

impl HcoLandscape {
    pub fn build(
        records: &[Record],
        territories: Option<&TerritoryMap>,
        options: &ViewOptions,
    ) -> Self {
        let mut tiers = tally_by(records, GroupBy::Tier, territories, Entity::Hco);
        tiers.sort_by_key(|t| {
            let tier = Tier::parse(&t.key);
            (tier.is_none(), tier)
        });

        Self {
            totals: Totals::of(records),
            states: RegionLayer::build(
                records,
                GroupBy::State,
                territories,
                Entity::Hco,
                &options.palette,
            ),
            tiers,
            archetypes: tally_by(records, GroupBy::Archetype, territories, Entity::Hco),
            top_hcos: top_hcos(records, options.top_n),
        }
    }
}

/// Rendering accounts ranked by distinct patients, ties by MDM
pub fn top_hcos(records: &[Record], n: usize) -> Vec<HcoSummary> {
    let mut rows: Vec<HcoSummary> = accumulate_orgs(records, false)
        .into_iter()
        .map(|(mdm, acc)| HcoSummary {
            mdm,
            name: acc.name,
            tier: acc.tier.as_deref().and_then(Tier::parse).map(|t| t.to_string()),
            archetype: acc.archetype,
            state: acc.state,
            patients: acc.patients.len(),
            hcps: acc.hcps.len(),
        })
        .collect();
    rows.sort_by(|a, b| b.patients.cmp(&a.patients).then_with(|| a.mdm.cmp(&b.mdm)));
    rows.truncate(n);
    rows
}

/// The order a caller asked for, over the dimension's own default
pub fn ordered_rollup(
    records: &[Record],
    group: GroupBy,
    entity: Entity,
    territories: Option<&TerritoryMap>,
    order: Option<GroupOrder>,
) -> GroupCounts {
    let counts = crate::aggregate::rollup_with(records, group, entity, territories);
    match order {
        Some(order) => counts.ordered(order),
        None => counts,
    }
}
