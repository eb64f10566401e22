//! Record Model
//!
//! Flat HCP/HCO/patient/referral records as served by the portal, and the
//! ingestion boundary that normalizes them.
//!
//! ## Absence
//!
//! `null`, `"-"`, empty strings and `NaN` all deserialize to `None`.
//! Payloads with bare `NaN` tokens are rewritten by [`sanitize_json`]
//! before parsing, so [`parse_records`] accepts what the portal emits.

mod error;
mod geo;
mod sentinel;
mod territory;
mod types;

pub use error::{RecordError, RecordResult};
pub use geo::{normalize_zip5, state_code, state_name, GeoPoint, US_STATES};
pub use sentinel::{is_absent_text, sanitize_json};
pub use territory::TerritoryMap;
pub use types::{Drug, Period, Record, Segment, Tier};

use std::path::Path;

/// Parse a (possibly non-standard) JSON array of records
pub fn parse_records(raw: &str) -> RecordResult<Vec<Record>> {
    let clean = sanitize_json(raw);
    let records: Vec<Record> = serde_json::from_str(&clean)?;
    Ok(records)
}

/// Read and parse a local JSON dump
pub fn load_records(path: &Path) -> RecordResult<Vec<Record>> {
    let raw = std::fs::read_to_string(path).map_err(|e| RecordError::Io {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    let records = parse_records(&raw)?;
    tracing::debug!(path = ?path, records = records.len(), "Loaded records");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records_lenient() {
        let raw = r#"[
            {"PATIENT_ID": "P1", "HCO_STATE": "CA", "HCO_LAT": NaN, "HCO_LONG": NaN},
            {"PATIENT_ID": "-", "HCO_STATE": "-"}
        ]"#;
        let records = parse_records(raw).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].hco_state.as_deref(), Some("CA"));
        assert!(records[0].hco_point().is_none());
        assert_eq!(records[1].patient_id, None);
        assert_eq!(records[1].hco_state, None);
    }

    #[test]
    fn test_parse_records_rejects_garbage() {
        let err = parse_records("not json").unwrap_err();
        assert!(matches!(err, RecordError::Json(_)));
    }

    #[test]
    fn test_load_records_missing_file() {
        let err = load_records(Path::new("/nonexistent/records.json")).unwrap_err();
        assert!(matches!(err, RecordError::Io { .. }));
    }
}
