//! Shared pieces of the page models

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::aggregate::{tally_by, Entity, EntityTally, GroupBy, GroupCount, GroupCounts};
use crate::layout::LayoutConfig;
use crate::record::{GeoPoint, Record, TerritoryMap};
use crate::scale::{LegendBin, Palette, QuantileScale};

/// Errors building a page model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },
}

pub type ViewResult<T> = Result<T, ViewError>;

/// Rendering knobs shared by every page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewOptions {
    /// Choropleth palette
    #[serde(default)]
    pub palette: Palette,
    /// Marker palette
    #[serde(default = "Palette::oranges")]
    pub marker_palette: Palette,
    #[serde(default)]
    pub layout: LayoutConfig,
    /// Length of "top N" tables
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_top_n() -> usize {
    10
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            marker_palette: Palette::oranges(),
            layout: LayoutConfig::default(),
            top_n: default_top_n(),
        }
    }
}

/// A count with its choropleth color
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColoredCount {
    pub key: String,
    pub count: usize,
    pub color: String,
}

/// A tally with the color of the entity it is shaded by
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColoredTally {
    #[serde(flatten)]
    pub tally: EntityTally,
    pub color: String,
}

/// Per-region tallies shaded by one entity count
#[derive(Debug, Clone, Serialize)]
pub struct RegionLayer {
    pub shaded_by: Entity,
    pub regions: Vec<ColoredTally>,
    pub legend: Vec<LegendBin>,
}

impl RegionLayer {
    pub fn build(
        records: &[Record],
        group: GroupBy,
        territories: Option<&TerritoryMap>,
        shaded_by: Entity,
        palette: &Palette,
    ) -> Self {
        let tallies = tally_by(records, group, territories, shaded_by);
        let values: Vec<f64> = tallies.iter().map(|t| t.get(shaded_by) as f64).collect();
        let scale = QuantileScale::fit(&values, palette.clone());

        let regions = tallies
            .into_iter()
            .map(|tally| {
                let color = scale.color(tally.get(shaded_by) as f64).to_string();
                ColoredTally { tally, color }
            })
            .collect();

        Self {
            shaded_by,
            regions,
            legend: scale.legend(),
        }
    }

    /// Counts of the shading entity, for painting boundaries
    pub fn counts(&self) -> GroupCounts {
        self.regions
            .iter()
            .map(|r| GroupCount::new(r.tally.key.clone(), r.tally.get(self.shaded_by)))
            .collect::<Vec<_>>()
            .into()
    }

    /// The scale the layer was colored with
    pub fn scale(&self, palette: &Palette) -> QuantileScale {
        QuantileScale::fit(&self.counts().values(), palette.clone())
    }
}

/// Color every row of a count table with one fitted scale
pub fn color_counts(
    counts: &GroupCounts,
    palette: &Palette,
) -> (Vec<ColoredCount>, Vec<LegendBin>) {
    let scale = QuantileScale::fit(&counts.values(), palette.clone());
    let rows = counts
        .iter()
        .map(|c| ColoredCount {
            key: c.key.clone(),
            count: c.count,
            color: scale.color(c.count as f64).to_string(),
        })
        .collect();
    (rows, scale.legend())
}

/// Per-organization accumulator for map markers and summaries
#[derive(Debug, Default)]
pub(crate) struct OrgAccumulator {
    pub name: Option<String>,
    pub tier: Option<String>,
    pub archetype: Option<String>,
    pub state: Option<String>,
    pub point: Option<GeoPoint>,
    pub patients: HashSet<String>,
    pub hcps: HashSet<String>,
}

impl OrgAccumulator {
    fn fill(slot: &mut Option<String>, value: Option<&String>) {
        if slot.is_none() {
            *slot = value.cloned();
        }
    }

    /// Absorb a record on the rendering side
    pub fn add_rendering(&mut self, record: &Record) {
        Self::fill(&mut self.name, record.hco_name.as_ref());
        Self::fill(&mut self.tier, record.hco_tier.as_ref());
        Self::fill(
            &mut self.archetype,
            record.account_archetype.as_ref().or(record.hco_grouping.as_ref()),
        );
        if self.state.is_none() {
            self.state = record.hco_state_code().map(str::to_string);
        }
        if self.point.is_none() {
            self.point = record.hco_point();
        }
        self.add_ids(record);
    }

    /// Absorb a record on the referring side
    pub fn add_referring(&mut self, record: &Record) {
        Self::fill(&mut self.name, record.ref_hco_name.as_ref());
        if self.state.is_none() {
            self.state = record
                .ref_hco_state
                .as_deref()
                .and_then(crate::record::state_code)
                .map(str::to_string);
        }
        if self.point.is_none() {
            self.point = record.ref_hco_point();
        }
        self.add_ids(record);
    }

    fn add_ids(&mut self, record: &Record) {
        if let Some(id) = Entity::Patient.id_of(record) {
            self.patients.insert(id.to_string());
        }
        if let Some(id) = Entity::Hcp.id_of(record) {
            self.hcps.insert(id.to_string());
        }
    }
}

/// Group records by organization MDM on the chosen side
pub(crate) fn accumulate_orgs(
    records: &[Record],
    referring: bool,
) -> BTreeMap<String, OrgAccumulator> {
    let mut orgs: BTreeMap<String, OrgAccumulator> = BTreeMap::new();
    for record in records {
        let mdm = if referring {
            record.ref_hco_mdm.as_ref()
        } else {
            record.hco_mdm.as_ref()
        };
        let Some(mdm) = mdm else {
            continue;
        };
        let acc = orgs.entry(mdm.clone()).or_default();
        if referring {
            acc.add_referring(record);
        } else {
            acc.add_rendering(record);
        }
    }
    orgs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(state: &str, patient: &str, hco: &str) -> Record {
        Record {
            hco_state: Some(state.to_string()),
            patient_id: Some(patient.to_string()),
            hco_mdm: Some(hco.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_region_layer_shading() {
        let records = vec![
            record("CA", "P1", "H1"),
            record("CA", "P2", "H1"),
            record("CA", "P3", "H2"),
            record("NY", "P4", "H3"),
        ];
        let palette = Palette::new(&["#000001", "#000002"]).unwrap();
        let layer = RegionLayer::build(&records, GroupBy::State, None, Entity::Patient, &palette);

        assert_eq!(layer.regions[0].tally.key, "CA");
        assert_eq!(layer.regions[0].tally.patients, 3);
        assert_eq!(layer.regions[0].tally.hcos, 2);
        assert_eq!(layer.regions[0].color, "#000002");
        assert_eq!(layer.regions[1].color, "#000001");
        assert_eq!(layer.counts().get("NY"), Some(1));
        assert_eq!(layer.legend.len(), 2);
    }

    #[test]
    fn test_color_counts() {
        let counts = GroupCounts::from(vec![GroupCount::new("A", 0), GroupCount::new("B", 5)]);
        let (rows, legend) = color_counts(&counts, &Palette::blues());
        assert_eq!(rows[0].color, Palette::blues().lightest());
        assert_eq!(rows[1].count, 5);
        assert!(!legend.is_empty());
    }

    #[test]
    fn test_accumulate_orgs_sides() {
        let referral = Record {
            patient_id: Some("P1".to_string()),
            hco_mdm: Some("H1".to_string()),
            hco_name: Some("Rendering".to_string()),
            ref_hco_mdm: Some("H2".to_string()),
            ref_hco_name: Some("Referring".to_string()),
            ref_hco_lat: Some(40.0),
            ref_hco_long: Some(-75.0),
            ..Default::default()
        };

        let rendering = accumulate_orgs(std::slice::from_ref(&referral), false);
        assert_eq!(rendering["H1"].name.as_deref(), Some("Rendering"));
        assert!(rendering["H1"].point.is_none());

        let referring = accumulate_orgs(&[referral], true);
        assert_eq!(referring["H2"].name.as_deref(), Some("Referring"));
        assert!(referring["H2"].point.is_some());
        assert_eq!(referring["H2"].patients.len(), 1);
    }
}
