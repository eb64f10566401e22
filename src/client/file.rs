//! Local JSON dump as a record source

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{RecordSource, SourceResult};
use crate::record::{load_records, Record, RecordError, TerritoryMap};

/// Serves a dataset loaded once from disk
///
/// 360 lookups filter the dump in memory: an HCP matches by name
/// (case-insensitive) or id on either side of the referral, an HCO by
/// MDM id on either side.
pub struct FileSource {
    path: PathBuf,
    records: Arc<Vec<Record>>,
    territories: TerritoryMap,
}

impl FileSource {
    /// Load a dump and an optional territory file
    pub fn open(path: &Path, territories: Option<&Path>) -> SourceResult<Self> {
        let records = load_records(path)?;
        let territories = match territories {
            Some(t) => {
                let raw = std::fs::read_to_string(t).map_err(|e| RecordError::Io {
                    path: t.to_path_buf(),
                    error: e.to_string(),
                })?;
                TerritoryMap::parse(&raw)?
            }
            None => TerritoryMap::new(),
        };

        tracing::info!(
            path = ?path,
            records = records.len(),
            territory_zips = territories.len(),
            "Opened local dataset"
        );

        Ok(Self {
            path: path.to_path_buf(),
            records: Arc::new(records),
            territories,
        })
    }

    /// Wrap records already in memory
    pub fn from_records(records: Vec<Record>, territories: TerritoryMap) -> Self {
        Self {
            path: PathBuf::from("<memory>"),
            records: Arc::new(records),
            territories,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn filter<F>(&self, pred: F) -> Vec<Record>
    where
        F: Fn(&Record) -> bool,
    {
        self.records.iter().filter(|r| pred(r)).cloned().collect()
    }
}

fn same_name(field: &Option<String>, name: &str) -> bool {
    field
        .as_deref()
        .map(|f| f.trim().eq_ignore_ascii_case(name))
        .unwrap_or(false)
}

fn same_id(field: &Option<String>, id: &str) -> bool {
    field.as_deref().map(|f| f.trim() == id).unwrap_or(false)
}

#[async_trait]
impl RecordSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch_all(&self) -> SourceResult<Vec<Record>> {
        Ok(self.records.as_ref().clone())
    }

    async fn fetch_hcp_360(&self, name: &str) -> SourceResult<Vec<Record>> {
        let name = name.trim();
        Ok(self.filter(|r| {
            same_name(&r.hcp_name, name)
                || same_name(&r.ref_hcp_name, name)
                || same_id(&r.hcp_id, name)
                || same_id(&r.ref_hcp_id, name)
        }))
    }

    async fn fetch_hco_360(&self, mdm: &str) -> SourceResult<Vec<Record>> {
        let mdm = mdm.trim();
        Ok(self.filter(|r| same_id(&r.hco_mdm, mdm) || same_id(&r.ref_hco_mdm, mdm)))
    }

    async fn fetch_territories(&self) -> SourceResult<TerritoryMap> {
        Ok(self.territories.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SourceError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const DUMP: &str = r#"[
        {"PATIENT_ID": "P1", "HCP_NAME": "Dr. Ada", "HCO_MDM": "H1", "REF_HCO_MDM": "H2", "REF_HCP_NAME": "Dr. Bo"},
        {"PATIENT_ID": "P2", "HCP_NAME": "dr. ada", "HCO_MDM": "H3"},
        {"PATIENT_ID": "P3", "HCP_NAME": "Dr. Cy", "HCO_MDM": "H2", "HCO_LAT": NaN}
    ]"#;

    fn dump_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(DUMP.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_open_and_fetch_all() {
        let file = dump_file();
        let source = FileSource::open(file.path(), None).unwrap();
        assert_eq!(source.len(), 3);
        assert_eq!(source.fetch_all().await.unwrap().len(), 3);
        assert!(source.fetch_territories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hcp_360_either_side() {
        let file = dump_file();
        let source = FileSource::open(file.path(), None).unwrap();

        let ada = source.fetch_hcp_360("DR. ADA").await.unwrap();
        assert_eq!(ada.len(), 2);

        let bo = source.fetch_hcp_360("Dr. Bo").await.unwrap();
        assert_eq!(bo.len(), 1);
        assert_eq!(bo[0].patient_id.as_deref(), Some("P1"));

        assert!(source.fetch_hcp_360("Nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hco_360_either_side() {
        let file = dump_file();
        let source = FileSource::open(file.path(), None).unwrap();

        let h2 = source.fetch_hco_360(" H2 ").await.unwrap();
        let patients: Vec<_> = h2.iter().filter_map(|r| r.patient_id.as_deref()).collect();
        assert_eq!(patients, vec!["P1", "P3"]);
    }

    #[tokio::test]
    async fn test_territory_file() {
        let file = dump_file();
        let mut territories = NamedTempFile::new().unwrap();
        territories
            .write_all(br#"[{"ZIP": "2115", "TERRITORY": "Boston"}]"#)
            .unwrap();

        let source = FileSource::open(file.path(), Some(territories.path())).unwrap();
        let map = source.fetch_territories().await.unwrap();
        assert_eq!(map.territory_of("02115"), Some("Boston"));
    }

    #[test]
    fn test_missing_file() {
        let err = FileSource::open(Path::new("/nonexistent/dump.json"), None)
            .err()
            .unwrap();
        assert!(matches!(err, SourceError::Parse(RecordError::Io { .. })));
    }
}
