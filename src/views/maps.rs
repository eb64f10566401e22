//! Map pages: account markers, referral flows and state choropleth

use serde::Serialize;

use crate::aggregate::{
    referral_pairs, rollup, Entity, GroupBy, GroupCount, GroupCounts, ReferralPair,
};
use crate::record::{Record, TerritoryMap, Tier};
use crate::scale::{paint_boundaries, zip_key, LegendBin, QuantileScale};

use super::common::{accumulate_orgs, color_counts, ColoredCount, RegionLayer, ViewOptions};

/// One account pin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountMarker {
    pub mdm: String,
    pub name: Option<String>,
    pub tier: Option<String>,
    pub archetype: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub patients: usize,
    pub color: String,
}

/// Rendering accounts on a map, plus ZIP-level patient counts
#[derive(Debug, Clone, Serialize)]
pub struct AccountMap {
    pub markers: Vec<AccountMarker>,
    /// Accounts dropped for lack of usable coordinates
    pub discarded: usize,
    pub legend: Vec<LegendBin>,
    pub zips: Vec<ColoredCount>,
    pub zip_legend: Vec<LegendBin>,
    /// Painted ZIP boundaries, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_boundaries: Option<serde_json::Value>,
}

impl AccountMap {
    pub fn build(records: &[Record], options: &ViewOptions) -> Self {
        let mut discarded = 0;
        let mut pins = Vec::new();
        for (mdm, acc) in accumulate_orgs(records, false) {
            let Some(point) = acc.point else {
                discarded += 1;
                continue;
            };
            pins.push((mdm, acc, point));
        }
        if discarded > 0 {
            tracing::debug!(discarded, "Accounts without usable coordinates");
        }

        let counts: Vec<f64> = pins.iter().map(|(_, acc, _)| acc.patients.len() as f64).collect();
        let scale = QuantileScale::fit(&counts, options.marker_palette.clone());

        let mut markers: Vec<AccountMarker> = pins
            .into_iter()
            .map(|(mdm, acc, point)| {
                let patients = acc.patients.len();
                AccountMarker {
                    mdm,
                    name: acc.name,
                    tier: acc.tier.as_deref().and_then(Tier::parse).map(|t| t.to_string()),
                    archetype: acc.archetype,
                    lat: point.lat,
                    lng: point.lng,
                    patients,
                    color: scale.color(patients as f64).to_string(),
                }
            })
            .collect();
        markers.sort_by(|a, b| b.patients.cmp(&a.patients).then_with(|| a.mdm.cmp(&b.mdm)));

        let zip_counts = rollup(records, GroupBy::Zip, Entity::Patient);
        let (zips, zip_legend) = color_counts(&zip_counts, &options.palette);

        Self {
            markers,
            discarded,
            legend: scale.legend(),
            zips,
            zip_legend,
            zip_boundaries: None,
        }
    }

    /// Attach ZIP boundaries painted with the same scale as `zips`
    pub fn with_zip_boundaries(
        mut self,
        mut geojson: serde_json::Value,
        options: &ViewOptions,
    ) -> Self {
        let counts = GroupCounts::from(
            self.zips
                .iter()
                .map(|z| GroupCount::new(z.key.clone(), z.count))
                .collect::<Vec<_>>(),
        );
        let scale = QuantileScale::fit(&counts.values(), options.palette.clone());
        let matched = paint_boundaries(&mut geojson, &counts, &scale, zip_key);
        tracing::debug!(matched, "Painted ZIP boundaries");
        self.zip_boundaries = Some(geojson);
        self
    }
}

/// One referring-account pin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferralMarker {
    pub mdm: String,
    pub name: Option<String>,
    pub lat: f64,
    pub lng: f64,
    /// Distinct patients referred out
    pub patients: usize,
    pub color: String,
}

/// Organization-to-organization referral flows
#[derive(Debug, Clone, Serialize)]
pub struct ReferralMap {
    pub pairs: Vec<ReferralPair>,
    /// Pairs (over all, not only the top ones) staying inside one account
    pub within_network: usize,
    pub out_of_network: usize,
    pub markers: Vec<ReferralMarker>,
    pub discarded: usize,
    pub legend: Vec<LegendBin>,
}

impl ReferralMap {
    pub fn build(records: &[Record], options: &ViewOptions) -> Self {
        let mut pairs = referral_pairs(records, Entity::Patient);
        let within_network = pairs.iter().filter(|p| p.within_network).count();
        let out_of_network = pairs.len() - within_network;
        pairs.truncate(options.top_n);

        let mut discarded = 0;
        let mut pins = Vec::new();
        for (mdm, acc) in accumulate_orgs(records, true) {
            match acc.point {
                Some(point) => pins.push((mdm, acc.name, point, acc.patients.len())),
                None => discarded += 1,
            }
        }

        let counts: Vec<f64> = pins.iter().map(|(_, _, _, n)| *n as f64).collect();
        let scale = QuantileScale::fit(&counts, options.marker_palette.clone());

        let mut markers: Vec<ReferralMarker> = pins
            .into_iter()
            .map(|(mdm, name, point, patients)| ReferralMarker {
                mdm,
                name,
                lat: point.lat,
                lng: point.lng,
                patients,
                color: scale.color(patients as f64).to_string(),
            })
            .collect();
        markers.sort_by(|a, b| b.patients.cmp(&a.patients).then_with(|| a.mdm.cmp(&b.mdm)));

        Self {
            pairs,
            within_network,
            out_of_network,
            markers,
            discarded,
            legend: scale.legend(),
        }
    }
}

/// State choropleth for the map page
#[derive(Debug, Clone, Serialize)]
pub struct StateMap {
    #[serde(flatten)]
    pub layer: RegionLayer,
    /// Painted boundaries, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geojson: Option<serde_json::Value>,
}

impl StateMap {
    pub fn build(
        records: &[Record],
        territories: Option<&TerritoryMap>,
        shaded_by: Entity,
        options: &ViewOptions,
    ) -> Self {
        Self {
            layer: RegionLayer::build(
                records,
                GroupBy::State,
                territories,
                shaded_by,
                &options.palette,
            ),
            geojson: None,
        }
    }

    /// Attach boundaries painted with this map's counts and colors
    pub fn with_boundaries(
        mut self,
        mut geojson: serde_json::Value,
        options: &ViewOptions,
    ) -> Self {
        let counts = self.layer.counts();
        let scale = self.layer.scale(&options.palette);
        let matched =
            crate::scale::paint_boundaries(&mut geojson, &counts, &scale, crate::scale::state_key);
        tracing::debug!(matched, "Painted state boundaries");
        self.geojson = Some(geojson);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn account(mdm: &str, lat: Option<f64>, lng: Option<f64>, patient: &str) -> Record {
        Record {
            hco_mdm: Some(mdm.to_string()),
            hco_name: Some(format!("{} Hospital", mdm)),
            hco_tier: Some("1".to_string()),
            hco_lat: lat,
            hco_long: lng,
            hco_zip: Some("02115".to_string()),
            hco_state: Some("MA".to_string()),
            patient_id: Some(patient.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_account_map_drops_bad_coordinates() {
        let records = vec![
            account("H1", Some(42.3), Some(-71.1), "P1"),
            account("H1", Some(42.3), Some(-71.1), "P2"),
            account("H2", Some(f64::NAN), Some(-71.1), "P3"),
            account("H3", Some(95.0), Some(-71.1), "P4"),
            account("H4", None, None, "P5"),
            account("H5", Some(40.7), Some(-74.0), "P6"),
        ];
        let map = AccountMap::build(&records, &ViewOptions::default());

        assert_eq!(map.markers.len(), 2);
        assert_eq!(map.discarded, 3);
        assert_eq!(map.markers[0].mdm, "H1");
        assert_eq!(map.markers[0].patients, 2);
        assert_eq!(map.markers[0].tier.as_deref(), Some("Tier 1"));
        assert_ne!(map.markers[0].color, map.markers[1].color);

        assert_eq!(map.zips.len(), 1);
        assert_eq!(map.zips[0].key, "02115");
        assert_eq!(map.zips[0].count, 6);
    }

    #[test]
    fn test_account_map_zip_boundaries() {
        let records = vec![
            account("M1", Some(42.33), Some(-71.10), "P1"),
            account("M2", Some(42.34), Some(-71.11), "P2"),
        ];
        let geojson = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"ZCTA5CE10": "02115"}},
                {"type": "Feature", "properties": {"ZCTA5CE10": "10001"}}
            ]
        });

        let map = AccountMap::build(&records, &ViewOptions::default())
            .with_zip_boundaries(geojson, &ViewOptions::default());

        let painted = map.zip_boundaries.unwrap();
        assert_eq!(painted["features"][0]["properties"]["count"], 2);
        assert_eq!(painted["features"][1]["properties"]["count"], 0);
    }

    #[test]
    fn test_account_map_empty() {
        let map = AccountMap::build(&[], &ViewOptions::default());
        assert!(map.markers.is_empty());
        assert_eq!(map.discarded, 0);
        assert_eq!(map.legend.len(), 1);
        assert_eq!(map.legend[0].color, ViewOptions::default().marker_palette.lightest());
    }

    fn referral(from: &str, to: &str, patient: &str, lat: Option<f64>) -> Record {
        Record {
            ref_hco_mdm: Some(from.to_string()),
            ref_hco_name: Some(format!("{} Clinic", from)),
            ref_hco_lat: lat,
            ref_hco_long: lat.map(|_| -80.0),
            hco_mdm: Some(to.to_string()),
            patient_id: Some(patient.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_referral_map() {
        let records = vec![
            referral("R1", "H1", "P1", Some(35.0)),
            referral("R1", "H1", "P2", Some(35.0)),
            referral("H1", "H1", "P3", None),
            referral("R2", "H2", "P4", Some(36.0)),
        ];
        let options = ViewOptions {
            top_n: 2,
            ..Default::default()
        };
        let map = ReferralMap::build(&records, &options);

        assert_eq!(map.pairs.len(), 2);
        assert_eq!(map.pairs[0].referring_mdm, "R1");
        assert_eq!(map.pairs[0].count, 2);
        assert_eq!(map.within_network, 1);
        assert_eq!(map.out_of_network, 2);

        assert_eq!(map.markers.len(), 2);
        assert_eq!(map.markers[0].mdm, "R1");
        assert_eq!(map.markers[0].name.as_deref(), Some("R1 Clinic"));
        assert_eq!(map.discarded, 1);
    }

    #[test]
    fn test_state_map_with_boundaries() {
        let records = vec![
            account("H1", None, None, "P1"),
            account("H2", None, None, "P2"),
        ];
        let geojson = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "Massachusetts"}},
                {"type": "Feature", "properties": {"name": "Vermont"}}
            ]
        });

        let options = ViewOptions::default();
        let map = StateMap::build(&records, None, Entity::Patient, &options)
            .with_boundaries(geojson, &options);

        assert_eq!(map.layer.regions[0].tally.key, "MA");
        let painted = map.geojson.unwrap();
        assert_eq!(painted["features"][0]["properties"]["count"], 2);
        assert_eq!(painted["features"][1]["properties"]["count"], 0);
        assert_eq!(
            painted["features"][1]["properties"]["fill"],
            options.palette.lightest()
        );
    }
}
