//! Session-scoped dataset cache

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::client::{RecordSource, SourceResult};
use crate::record::{Record, TerritoryMap};

/// The full dataset plus the territory mapping it is read with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub records: Vec<Record>,
    #[serde(default)]
    pub territories: TerritoryMap,
    pub fetched_at: DateTime<Utc>,
}

impl Dataset {
    pub fn new(records: Vec<Record>, territories: TerritoryMap) -> Self {
        Self {
            records,
            territories,
            fetched_at: Utc::now(),
        }
    }
}

/// Holds the dataset between requests until logout or refresh
///
/// The source is hit only when the cache is empty. A failed fetch leaves
/// the cache empty so the next request tries again.
pub struct DatasetCache {
    slot: RwLock<Option<Arc<Dataset>>>,
    mirror: Option<PathBuf>,
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetCache {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
            mirror: None,
        }
    }

    /// Also keep a copy in `path`, reused by later processes
    pub fn with_mirror(path: impl Into<PathBuf>) -> Self {
        Self {
            slot: RwLock::new(None),
            mirror: Some(path.into()),
        }
    }

    pub fn mirror(&self) -> Option<&Path> {
        self.mirror.as_deref()
    }

    /// The cached dataset, if any, without fetching
    pub async fn cached(&self) -> Option<Arc<Dataset>> {
        self.slot.read().await.clone()
    }

    pub async fn is_cached(&self) -> bool {
        self.slot.read().await.is_some()
    }

    pub async fn get_or_fetch(&self, source: &dyn RecordSource) -> SourceResult<Arc<Dataset>> {
        if let Some(dataset) = self.slot.read().await.as_ref() {
            return Ok(Arc::clone(dataset));
        }

        let mut slot = self.slot.write().await;
        // Another request may have filled it while we waited for the lock
        if let Some(dataset) = slot.as_ref() {
            return Ok(Arc::clone(dataset));
        }

        if let Some(dataset) = self.read_mirror().await {
            let dataset = Arc::new(dataset);
            *slot = Some(Arc::clone(&dataset));
            return Ok(dataset);
        }

        let start = std::time::Instant::now();
        let records = source.fetch_all().await?;
        let territories = match source.fetch_territories().await {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(source = source.name(), error = %e, "Territory mapping unavailable");
                TerritoryMap::new()
            }
        };

        tracing::info!(
            source = source.name(),
            records = records.len(),
            territory_zips = territories.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Fetched dataset"
        );

        let dataset = Arc::new(Dataset::new(records, territories));
        self.write_mirror(&dataset).await;
        *slot = Some(Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Drop the cached dataset and its mirror
    pub async fn clear(&self) {
        let mut slot = self.slot.write().await;
        *slot = None;

        if let Some(path) = &self.mirror {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(path = ?path, error = %e, "Failed to remove cache mirror"),
            }
        }
        tracing::debug!("Dataset cache cleared");
    }

    async fn read_mirror(&self) -> Option<Dataset> {
        let path = self.mirror.as_ref()?;
        let raw = tokio::fs::read(path).await.ok()?;
        match serde_json::from_slice::<Dataset>(&raw) {
            Ok(dataset) => {
                tracing::debug!(
                    path = ?path,
                    records = dataset.records.len(),
                    "Loaded cache mirror"
                );
                Some(dataset)
            }
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Ignoring unreadable cache mirror");
                None
            }
        }
    }

    async fn write_mirror(&self, dataset: &Dataset) {
        let Some(path) = &self.mirror else {
            return;
        };

        let bytes = match serde_json::to_vec(dataset) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize cache mirror");
                return;
            }
        };
        if let Some(parent) = path.parent() {
            let _ = tokio::fs::create_dir_all(parent).await;
        }
        if let Err(e) = tokio::fs::write(path, bytes).await {
            tracing::warn!(path = ?path, error = %e, "Failed to write cache mirror");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{SourceError, SourceResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl RecordSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        async fn fetch_all(&self) -> SourceResult<Vec<Record>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SourceError::Unavailable);
            }
            Ok(vec![Record::default().with_patient("P1")])
        }

        async fn fetch_hcp_360(&self, _name: &str) -> SourceResult<Vec<Record>> {
            Ok(Vec::new())
        }

        async fn fetch_hco_360(&self, _mdm: &str) -> SourceResult<Vec<Record>> {
            Ok(Vec::new())
        }

        async fn fetch_territories(&self) -> SourceResult<TerritoryMap> {
            Err(SourceError::Api {
                status: 404,
                message: "no territories".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_fetches_once() {
        let cache = DatasetCache::new();
        let source = CountingSource::new(false);

        let first = cache.get_or_fetch(&source).await.unwrap();
        let second = cache.get_or_fetch(&source).await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.records.len(), 1);
        assert!(first.territories.is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let cache = DatasetCache::new();
        let source = CountingSource::new(true);

        assert!(matches!(
            cache.get_or_fetch(&source).await,
            Err(SourceError::Unavailable)
        ));
        assert!(!cache.is_cached().await);

        assert!(cache.get_or_fetch(&source).await.is_err());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clear_forces_refetch() {
        let cache = DatasetCache::new();
        let source = CountingSource::new(false);

        cache.get_or_fetch(&source).await.unwrap();
        cache.clear().await;
        assert!(cache.cached().await.is_none());

        cache.get_or_fetch(&source).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_mirror_reused_across_caches() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dataset.json");
        let source = CountingSource::new(false);

        let cache = DatasetCache::with_mirror(&path);
        cache.get_or_fetch(&source).await.unwrap();
        assert!(path.exists());

        let reopened = DatasetCache::with_mirror(&path);
        let dataset = reopened.get_or_fetch(&source).await.unwrap();
        assert_eq!(dataset.records[0].patient_id.as_deref(), Some("P1"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        reopened.clear().await;
        assert!(!path.exists());
    }
}
