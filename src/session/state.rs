//! Active page, filters and selection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::{SessionError, SessionResult};
use crate::record::{state_code, Record, TerritoryMap};

/// Dashboard pages; exactly one is active
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    #[default]
    HcpLandscape,
    HcoLandscape,
    AccountMap,
    ReferralMap,
    HcpDeepDive,
    HcoDeepDive,
}

impl Page {
    pub const ALL: [Page; 6] = [
        Page::HcpLandscape,
        Page::HcoLandscape,
        Page::AccountMap,
        Page::ReferralMap,
        Page::HcpDeepDive,
        Page::HcoDeepDive,
    ];

    /// Stable name, used for persistence
    pub fn name(&self) -> &'static str {
        match self {
            Page::HcpLandscape => "hcp_landscape",
            Page::HcoLandscape => "hco_landscape",
            Page::AccountMap => "account_map",
            Page::ReferralMap => "referral_map",
            Page::HcpDeepDive => "hcp_deep_dive",
            Page::HcoDeepDive => "hco_deep_dive",
        }
    }

    pub fn is_deep_dive(&self) -> bool {
        matches!(self, Page::HcpDeepDive | Page::HcoDeepDive)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Page {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', ' '], "_");
        Page::ALL
            .iter()
            .copied()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| format!("Unknown page: {}", s))
    }
}

/// Referring vs. rendering organization comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrgRelationship {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "within")]
    WithinNetwork,
    #[serde(rename = "outside")]
    OutOfNetwork,
}

impl FromStr for OrgRelationship {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "" => Ok(OrgRelationship::All),
            "within" | "within_network" | "in" => Ok(OrgRelationship::WithinNetwork),
            "outside" | "out_of_network" | "out" => Ok(OrgRelationship::OutOfNetwork),
            _ => Err(format!("Unknown relationship: {}", s)),
        }
    }
}

/// Record filters shared by every page
///
/// An unset field matches everything. A set field rejects records whose
/// corresponding value is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    /// State code or name, compared on the rendering HCO's state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub territory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(default)]
    pub relationship: OrgRelationship,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        self.state.is_none()
            && self.year.is_none()
            && self.territory.is_none()
            && self.specialty.is_none()
            && self.relationship == OrgRelationship::All
    }

    pub fn matches(&self, record: &Record, territories: Option<&TerritoryMap>) -> bool {
        if let Some(state) = &self.state {
            let wanted = state_code(state);
            let have = record.hco_state_code().or_else(|| record.hcp_state_code());
            match (wanted, have) {
                (Some(w), Some(h)) if w == h => {}
                _ => return false,
            }
        }

        if let Some(year) = self.year {
            if record.year != Some(year) {
                return false;
            }
        }

        if let Some(territory) = &self.territory {
            let have = territories.and_then(|t| t.territory_of_record(record));
            match have {
                Some(h) if h.eq_ignore_ascii_case(territory.trim()) => {}
                _ => return false,
            }
        }

        if let Some(specialty) = &self.specialty {
            match record.hcp_specialty.as_deref() {
                Some(s) if s.trim().eq_ignore_ascii_case(specialty.trim()) => {}
                _ => return false,
            }
        }

        match self.relationship {
            OrgRelationship::All => true,
            OrgRelationship::WithinNetwork => record.within_network() == Some(true),
            OrgRelationship::OutOfNetwork => record.within_network() == Some(false),
        }
    }

    pub fn apply(&self, records: &[Record], territories: Option<&TerritoryMap>) -> Vec<Record> {
        if self.is_empty() {
            return records.to_vec();
        }
        records
            .iter()
            .filter(|r| self.matches(r, territories))
            .cloned()
            .collect()
    }
}

/// What the user clicked last
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Selection {
    #[default]
    None,
    State(String),
    Zip(String),
    /// HCP by name
    Hcp(String),
    /// HCO by MDM id
    Hco(String),
}

/// Navigation state of one dashboard session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub page: Page,
    #[serde(default)]
    pub filters: Filters,
    #[serde(default)]
    pub selection: Selection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<Page>,
}

impl ViewState {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            ..Default::default()
        }
    }

    /// Switch pages; the selection does not carry over
    pub fn navigate(&mut self, page: Page) {
        self.page = page;
        self.selection = Selection::None;
        self.previous = None;
    }

    pub fn select(&mut self, selection: Selection) {
        self.selection = selection;
    }

    /// Open the deep dive for the selected HCP or HCO
    pub fn drill_down(&mut self) -> SessionResult<Page> {
        let target = match self.selection {
            Selection::Hcp(_) => Page::HcpDeepDive,
            Selection::Hco(_) => Page::HcoDeepDive,
            _ => return Err(SessionError::NoSelection),
        };

        if !self.page.is_deep_dive() {
            self.previous = Some(self.page);
        }
        self.page = target;
        Ok(target)
    }

    /// Return to the page the deep dive was opened from
    pub fn back(&mut self) -> Page {
        let page = self.previous.take().unwrap_or_default();
        self.page = page;
        self.selection = Selection::None;
        page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(state: &str, year: i32, specialty: &str) -> Record {
        Record {
            patient_id: Some("P1".to_string()),
            hco_state: Some(state.to_string()),
            year: Some(year),
            hcp_specialty: Some(specialty.to_string()),
            hcp_zip: Some("02115".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_page_names_roundtrip() {
        for page in Page::ALL {
            assert_eq!(page.name().parse::<Page>().unwrap(), page);
        }
        assert_eq!("HCP Deep Dive".parse::<Page>().unwrap(), Page::HcpDeepDive);
        assert!("settings".parse::<Page>().is_err());
        assert_eq!(Page::default(), Page::HcpLandscape);
    }

    #[test]
    fn test_empty_filters_match_everything() {
        let filters = Filters::default();
        assert!(filters.is_empty());
        assert!(filters.matches(&Record::default(), None));
    }

    #[test]
    fn test_state_filter() {
        let filters = Filters {
            state: Some("California".to_string()),
            ..Default::default()
        };
        assert!(filters.matches(&record("CA", 2023, "Neurology"), None));
        assert!(!filters.matches(&record("NY", 2023, "Neurology"), None));
        assert!(!filters.matches(&Record::default(), None));
    }

    #[test]
    fn test_year_and_specialty_filters() {
        let filters = Filters {
            year: Some(2023),
            specialty: Some("neurology".to_string()),
            ..Default::default()
        };
        assert!(filters.matches(&record("CA", 2023, "Neurology"), None));
        assert!(!filters.matches(&record("CA", 2022, "Neurology"), None));
        assert!(!filters.matches(&record("CA", 2023, "Pediatrics"), None));
    }

    #[test]
    fn test_territory_filter() {
        let mut territories = TerritoryMap::new();
        territories.insert("02115", "Boston");

        let filters = Filters {
            territory: Some("boston".to_string()),
            ..Default::default()
        };
        assert!(filters.matches(&record("MA", 2023, "Neurology"), Some(&territories)));
        assert!(!filters.matches(&record("MA", 2023, "Neurology"), None));

        let elsewhere = Record {
            hcp_zip: Some("90210".to_string()),
            ..Default::default()
        };
        assert!(!filters.matches(&elsewhere, Some(&territories)));
    }

    #[test]
    fn test_relationship_filter() {
        let within = Record {
            hco_mdm: Some("H1".to_string()),
            ref_hco_mdm: Some("H1".to_string()),
            ..Default::default()
        };
        let outside = Record {
            hco_mdm: Some("H1".to_string()),
            ref_hco_mdm: Some("H2".to_string()),
            ..Default::default()
        };
        let unknown = Record {
            hco_mdm: Some("H1".to_string()),
            ..Default::default()
        };

        let filters = Filters {
            relationship: OrgRelationship::WithinNetwork,
            ..Default::default()
        };
        assert!(filters.matches(&within, None));
        assert!(!filters.matches(&outside, None));
        assert!(!filters.matches(&unknown, None));

        let filters = Filters {
            relationship: OrgRelationship::OutOfNetwork,
            ..Default::default()
        };
        assert_eq!(
            filters.apply(&[within, outside.clone(), unknown], None),
            vec![outside]
        );
    }

    #[test]
    fn test_filters_from_query_shape() {
        let filters: Filters =
            serde_json::from_str(r#"{"state": "TX", "year": 2024, "relationship": "within"}"#)
                .unwrap();
        assert_eq!(filters.state.as_deref(), Some("TX"));
        assert_eq!(filters.year, Some(2024));
        assert_eq!(filters.relationship, OrgRelationship::WithinNetwork);
    }

    #[test]
    fn test_navigate_clears_selection() {
        let mut view = ViewState::default();
        view.select(Selection::State("CA".to_string()));
        view.navigate(Page::AccountMap);
        assert_eq!(view.page, Page::AccountMap);
        assert_eq!(view.selection, Selection::None);
    }

    #[test]
    fn test_drill_down_and_back() {
        let mut view = ViewState::new(Page::AccountMap);
        assert!(matches!(view.drill_down(), Err(SessionError::NoSelection)));

        view.select(Selection::Hco("H1".to_string()));
        assert_eq!(view.drill_down().unwrap(), Page::HcoDeepDive);
        assert_eq!(view.previous, Some(Page::AccountMap));

        // Drilling from one deep dive into another keeps the original origin
        view.select(Selection::Hcp("Dr. Ada".to_string()));
        assert_eq!(view.drill_down().unwrap(), Page::HcpDeepDive);
        assert_eq!(view.previous, Some(Page::AccountMap));

        assert_eq!(view.back(), Page::AccountMap);
        assert_eq!(view.page, Page::AccountMap);
        assert_eq!(view.previous, None);
    }

    #[test]
    fn test_selection_serialization() {
        let json = serde_json::to_value(Selection::Hcp("Dr. Ada".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "hcp", "value": "Dr. Ada"}));
        let json = serde_json::to_value(Selection::None).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "none"}));
    }
}
