//! ZIP-to-territory mapping

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use super::error::RecordResult;
use super::geo::normalize_zip5;
use super::sentinel::{self, sanitize_json};
use super::types::Record;

/// Sales territory assignment keyed by five-digit ZIP
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TerritoryMap {
    zips: HashMap<String, String>,
}

/// One row of the portal's territory endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct TerritoryRow {
    #[serde(default, alias = "ZIP_CODE", deserialize_with = "sentinel::opt_text")]
    zip: Option<String>,
    #[serde(default, alias = "TERRITORY_NAME", deserialize_with = "sentinel::opt_text")]
    territory: Option<String>,
}

impl TerritoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the territory payload, skipping rows with an unusable ZIP or name
    pub fn parse(raw: &str) -> RecordResult<Self> {
        let rows: Vec<TerritoryRow> = serde_json::from_str(&sanitize_json(raw))?;
        let mut map = Self::new();
        let mut skipped = 0usize;

        for row in rows {
            let inserted = match (row.zip, row.territory) {
                (Some(zip), Some(territory)) => map.insert(&zip, &territory),
                _ => false,
            };
            if !inserted {
                skipped += 1;
            }
        }

        if skipped > 0 {
            tracing::debug!(skipped, "Skipped territory rows without ZIP or territory");
        }
        Ok(map)
    }

    /// Assign a ZIP to a territory; returns false if the ZIP is unusable
    pub fn insert(&mut self, zip: &str, territory: &str) -> bool {
        match normalize_zip5(zip) {
            Some(zip5) => {
                self.zips.insert(zip5, territory.trim().to_string());
                true
            }
            None => false,
        }
    }

    /// Territory for a ZIP in any accepted format
    pub fn territory_of(&self, zip: &str) -> Option<&str> {
        let zip5 = normalize_zip5(zip)?;
        self.zips.get(&zip5).map(String::as_str)
    }

    /// Territory of a record: the prescriber's ZIP, else the account's
    pub fn territory_of_record(&self, record: &Record) -> Option<&str> {
        record
            .hcp_zip
            .as_deref()
            .and_then(|z| self.territory_of(z))
            .or_else(|| record.hco_zip.as_deref().and_then(|z| self.territory_of(z)))
    }

    /// Distinct territory names, sorted
    pub fn territories(&self) -> Vec<String> {
        self.zips
            .values()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.zips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zips.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_territories() {
        let raw = r#"[
            {"ZIP": "02115", "TERRITORY": "Boston"},
            {"ZIP": 2116, "TERRITORY": "Boston"},
            {"ZIP_CODE": "90210-1234", "TERRITORY_NAME": "Los Angeles"},
            {"ZIP": "-", "TERRITORY": "Nowhere"},
            {"ZIP": "10001", "TERRITORY": NaN}
        ]"#;
        let map = TerritoryMap::parse(raw).unwrap();

        assert_eq!(map.len(), 3);
        assert_eq!(map.territory_of("2115"), Some("Boston"));
        assert_eq!(map.territory_of("02116"), Some("Boston"));
        assert_eq!(map.territory_of("90210"), Some("Los Angeles"));
        assert_eq!(map.territory_of("10001"), None);
        assert_eq!(map.territories(), vec!["Boston", "Los Angeles"]);
    }

    #[test]
    fn test_territory_of_record_prefers_prescriber_zip() {
        let mut map = TerritoryMap::new();
        map.insert("02115", "Boston");
        map.insert("90210", "Los Angeles");

        let record = Record {
            hcp_zip: Some("90210".to_string()),
            hco_zip: Some("02115".to_string()),
            ..Default::default()
        };
        assert_eq!(map.territory_of_record(&record), Some("Los Angeles"));

        let record = Record {
            hco_zip: Some("02115".to_string()),
            ..Default::default()
        };
        assert_eq!(map.territory_of_record(&record), Some("Boston"));
    }
}
