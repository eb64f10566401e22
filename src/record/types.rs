//! Record and categorical types
//!
//! A [`Record`] is one flat observation per (HCP, HCO, patient, referral)
//! as the portal serves it. Every field is optional; sentinel values are
//! normalized to `None` during deserialization.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::geo::{normalize_zip5, state_code, GeoPoint};
use super::sentinel;

/// One flat treatment/referral observation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Record {
    // --- Patient ---
    #[serde(deserialize_with = "sentinel::opt_text", skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,

    // --- Prescriber (HCP) ---
    #[serde(deserialize_with = "sentinel::opt_text", skip_serializing_if = "Option::is_none")]
    pub hcp_id: Option<String>,
    #[serde(deserialize_with = "sentinel::opt_text", skip_serializing_if = "Option::is_none")]
    pub hcp_name: Option<String>,
    #[serde(deserialize_with = "sentinel::opt_text", skip_serializing_if = "Option::is_none")]
    pub hcp_specialty: Option<String>,
    #[serde(deserialize_with = "sentinel::opt_text", skip_serializing_if = "Option::is_none")]
    pub hcp_segment: Option<String>,
    #[serde(deserialize_with = "sentinel::opt_text", skip_serializing_if = "Option::is_none")]
    pub hcp_state: Option<String>,
    #[serde(deserialize_with = "sentinel::opt_text", skip_serializing_if = "Option::is_none")]
    pub hcp_zip: Option<String>,

    // --- Rendering organization (HCO) ---
    #[serde(deserialize_with = "sentinel::opt_text", skip_serializing_if = "Option::is_none")]
    pub hco_mdm: Option<String>,
    #[serde(deserialize_with = "sentinel::opt_text", skip_serializing_if = "Option::is_none")]
    pub hco_name: Option<String>,
    #[serde(deserialize_with = "sentinel::opt_text", skip_serializing_if = "Option::is_none")]
    pub hco_tier: Option<String>,
    #[serde(deserialize_with = "sentinel::opt_text", skip_serializing_if = "Option::is_none")]
    pub hco_grouping: Option<String>,
    #[serde(deserialize_with = "sentinel::opt_text", skip_serializing_if = "Option::is_none")]
    pub hco_state: Option<String>,
    #[serde(deserialize_with = "sentinel::opt_text", skip_serializing_if = "Option::is_none")]
    pub hco_zip: Option<String>,
    #[serde(deserialize_with = "sentinel::opt_number", skip_serializing_if = "Option::is_none")]
    pub hco_lat: Option<f64>,
    #[serde(deserialize_with = "sentinel::opt_number", skip_serializing_if = "Option::is_none")]
    pub hco_long: Option<f64>,

    // --- Referring side ---
    #[serde(deserialize_with = "sentinel::opt_text", skip_serializing_if = "Option::is_none")]
    pub ref_hcp_id: Option<String>,
    #[serde(deserialize_with = "sentinel::opt_text", skip_serializing_if = "Option::is_none")]
    pub ref_hcp_name: Option<String>,
    #[serde(deserialize_with = "sentinel::opt_text", skip_serializing_if = "Option::is_none")]
    pub ref_hco_mdm: Option<String>,
    #[serde(deserialize_with = "sentinel::opt_text", skip_serializing_if = "Option::is_none")]
    pub ref_hco_name: Option<String>,
    #[serde(deserialize_with = "sentinel::opt_text", skip_serializing_if = "Option::is_none")]
    pub ref_hco_state: Option<String>,
    #[serde(deserialize_with = "sentinel::opt_text", skip_serializing_if = "Option::is_none")]
    pub ref_hco_zip: Option<String>,
    #[serde(deserialize_with = "sentinel::opt_number", skip_serializing_if = "Option::is_none")]
    pub ref_hco_lat: Option<f64>,
    #[serde(deserialize_with = "sentinel::opt_number", skip_serializing_if = "Option::is_none")]
    pub ref_hco_long: Option<f64>,

    // --- Treatment and partition ---
    #[serde(deserialize_with = "sentinel::opt_text", skip_serializing_if = "Option::is_none")]
    pub drug_name: Option<String>,
    #[serde(deserialize_with = "sentinel::opt_year", skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(deserialize_with = "sentinel::opt_text", skip_serializing_if = "Option::is_none")]
    pub quarter: Option<String>,

    // --- Categorical attributes ---
    #[serde(deserialize_with = "sentinel::opt_text", skip_serializing_if = "Option::is_none")]
    pub age_group: Option<String>,
    #[serde(deserialize_with = "sentinel::opt_text", skip_serializing_if = "Option::is_none")]
    pub account_archetype: Option<String>,
}

impl Record {
    /// Rendering organization location, if the coordinates are usable
    pub fn hco_point(&self) -> Option<GeoPoint> {
        GeoPoint::from_parts(self.hco_lat, self.hco_long)
    }

    /// Referring organization location, if the coordinates are usable
    pub fn ref_hco_point(&self) -> Option<GeoPoint> {
        GeoPoint::from_parts(self.ref_hco_lat, self.ref_hco_long)
    }

    /// Rendering organization state as a two-letter code
    pub fn hco_state_code(&self) -> Option<&'static str> {
        self.hco_state.as_deref().and_then(state_code)
    }

    /// Prescriber state as a two-letter code
    pub fn hcp_state_code(&self) -> Option<&'static str> {
        self.hcp_state.as_deref().and_then(state_code)
    }

    /// Rendering organization ZIP, five digits
    pub fn hco_zip5(&self) -> Option<String> {
        self.hco_zip.as_deref().and_then(normalize_zip5)
    }

    pub fn tier(&self) -> Option<Tier> {
        self.hco_tier.as_deref().and_then(Tier::parse)
    }

    pub fn segment(&self) -> Option<Segment> {
        self.hcp_segment.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn drug(&self) -> Option<Drug> {
        self.drug_name.as_deref().map(Drug::parse)
    }

    pub fn period(&self) -> Option<Period> {
        Period::from_parts(self.year, self.quarter.as_deref())
    }

    /// Whether the referral stayed inside one organization
    ///
    /// `None` when either side is unknown.
    pub fn within_network(&self) -> Option<bool> {
        match (&self.hco_mdm, &self.ref_hco_mdm) {
            (Some(rendering), Some(referring)) => Some(rendering == referring),
            _ => None,
        }
    }

    /// Builder-style helper used by tests and benches
    pub fn with_patient(mut self, id: &str) -> Self {
        self.patient_id = Some(id.to_string());
        self
    }
}

/// SMA therapies in the portfolio
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub enum Drug {
    Zolgensma,
    Spinraza,
    Evrysdi,
    Other(String),
}

impl Drug {
    /// Parse a drug name (case-insensitive; unknown names are kept)
    pub fn parse(s: &str) -> Self {
        let t = s.trim();
        match t.to_ascii_lowercase().as_str() {
            "zolgensma" => Drug::Zolgensma,
            "spinraza" => Drug::Spinraza,
            "evrysdi" => Drug::Evrysdi,
            _ => Drug::Other(t.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Drug::Zolgensma => "Zolgensma",
            Drug::Spinraza => "Spinraza",
            Drug::Evrysdi => "Evrysdi",
            Drug::Other(name) => name,
        }
    }
}

impl From<Drug> for String {
    fn from(drug: Drug) -> Self {
        drug.name().to_string()
    }
}

impl fmt::Display for Drug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// HCP potential segment, highest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Segment {
    High,
    Moderate,
    Low,
    VeryLow,
}

impl Segment {
    /// Display rank: 1 for High through 4 for Very Low
    pub fn rank(&self) -> u8 {
        match self {
            Segment::High => 1,
            Segment::Moderate => 2,
            Segment::Low => 3,
            Segment::VeryLow => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Segment::High => "High",
            Segment::Moderate => "Moderate",
            Segment::Low => "Low",
            Segment::VeryLow => "Very Low",
        }
    }
}

impl FromStr for Segment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect();
        match normalized.as_str() {
            "high" => Ok(Segment::High),
            "moderate" => Ok(Segment::Moderate),
            "low" => Ok(Segment::Low),
            "verylow" => Ok(Segment::VeryLow),
            _ => Err(format!("Unknown segment: {}", s)),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// HCO tier number (1 is the highest potential)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Tier(pub u8);

impl Tier {
    /// Parse `"1"`, `"Tier 1"`, `"T1"` or `"1.0"`
    pub fn parse(s: &str) -> Option<Self> {
        let digits: String = s
            .trim()
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok().map(Tier)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tier {}", self.0)
    }
}

/// Year/quarter date partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Period {
    pub year: i32,
    pub quarter: u8,
}

impl Period {
    /// Combine the year column with a quarter such as `"Q3"`, `"3"` or `"2023Q3"`
    pub fn from_parts(year: Option<i32>, quarter: Option<&str>) -> Option<Self> {
        let year = year?;
        let quarter = quarter?
            .trim()
            .chars()
            .rev()
            .find(|c| c.is_ascii_digit())?
            .to_digit(10)? as u8;
        (1..=4).contains(&quarter).then_some(Self { year, quarter })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-Q{}", self.year, self.quarter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sentinels_deserialize_to_none() {
        let json = r#"{
            "PATIENT_ID": "P1",
            "HCP_ID": 1234567890,
            "HCP_NAME": "-",
            "HCO_STATE": "",
            "HCO_LAT": "NaN",
            "HCO_LONG": -118.2,
            "YEAR": "2023",
            "QUARTER": "Q2"
        }"#;
        let record: Record = serde_json::from_str(json).unwrap();

        assert_eq!(record.patient_id.as_deref(), Some("P1"));
        assert_eq!(record.hcp_id.as_deref(), Some("1234567890"));
        assert_eq!(record.hcp_name, None);
        assert_eq!(record.hco_state, None);
        assert_eq!(record.hco_lat, None);
        assert_eq!(record.hco_long, Some(-118.2));
        assert!(record.hco_point().is_none());
        assert_eq!(record.period(), Some(Period { year: 2023, quarter: 2 }));
        // Keys missing from the payload
        assert_eq!(record.ref_hco_mdm, None);
        assert_eq!(record.ref_hco_lat, None);
    }

    #[test]
    fn test_record_serialization_skips_absent() {
        let record = Record::default().with_patient("P9");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"PATIENT_ID":"P9"}"#);
    }

    #[test]
    fn test_drug_parse() {
        assert_eq!(Drug::parse("ZOLGENSMA"), Drug::Zolgensma);
        assert_eq!(Drug::parse(" spinraza "), Drug::Spinraza);
        assert_eq!(Drug::parse("Evrysdi"), Drug::Evrysdi);
        assert_eq!(Drug::parse("Other Rx"), Drug::Other("Other Rx".to_string()));
    }

    #[test]
    fn test_segment_parse_and_rank() {
        assert_eq!("High".parse::<Segment>(), Ok(Segment::High));
        assert_eq!("Very-Low".parse::<Segment>(), Ok(Segment::VeryLow));
        assert_eq!("very_low".parse::<Segment>(), Ok(Segment::VeryLow));
        assert_eq!("Very Low".parse::<Segment>(), Ok(Segment::VeryLow));
        assert!("Medium-ish".parse::<Segment>().is_err());
        assert!(Segment::High.rank() < Segment::Moderate.rank());
        assert!(Segment::Low.rank() < Segment::VeryLow.rank());
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!(Tier::parse("1"), Some(Tier(1)));
        assert_eq!(Tier::parse("Tier 2"), Some(Tier(2)));
        assert_eq!(Tier::parse("T3"), Some(Tier(3)));
        assert_eq!(Tier::parse("4.0"), Some(Tier(4)));
        assert_eq!(Tier::parse("Untiered"), None);
    }

    #[test]
    fn test_period() {
        assert_eq!(
            Period::from_parts(Some(2024), Some("2024Q1")),
            Some(Period { year: 2024, quarter: 1 })
        );
        assert_eq!(Period::from_parts(Some(2024), Some("Q7")), None);
        assert_eq!(Period::from_parts(None, Some("Q1")), None);
        assert!(Period { year: 2023, quarter: 4 } < Period { year: 2024, quarter: 1 });
        assert_eq!(Period { year: 2023, quarter: 4 }.to_string(), "2023-Q4");
    }

    #[test]
    fn test_within_network() {
        let mut record = Record::default();
        assert_eq!(record.within_network(), None);
        record.hco_mdm = Some("H1".to_string());
        record.ref_hco_mdm = Some("H1".to_string());
        assert_eq!(record.within_network(), Some(true));
        record.ref_hco_mdm = Some("H2".to_string());
        assert_eq!(record.within_network(), Some(false));
    }
}
