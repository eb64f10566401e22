//! Distinct Index - per-key unique-membership sets
//!
//! Maps group key → set of entity ids. This is the one place de-duplication
//! happens: an id is counted at most once per key no matter how many
//! records mention it.
//!
//! # Example
//! ```ignore
//! let mut index = DistinctIndex::new();
//! index.add("CA", "P1");
//! index.add("CA", "P1"); // duplicate, ignored
//! index.add("CA", "P2");
//! assert_eq!(index.count("CA"), 2);
//! ```

use crate::record::is_absent_text;
use std::collections::{HashMap, HashSet};

use super::group::{GroupCount, GroupCounts};

/// Group key → distinct ids
#[derive(Debug, Clone, Default)]
pub struct DistinctIndex {
    index: HashMap<String, HashSet<String>>,
}

impl DistinctIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an id under a key
    ///
    /// Returns true if the id was new for that key. Absent keys or ids
    /// (empty, `"-"`, `NaN`) are ignored.
    pub fn add(&mut self, key: &str, id: &str) -> bool {
        if is_absent_text(key) || is_absent_text(id) {
            return false;
        }

        self.index
            .entry(key.trim().to_string())
            .or_default()
            .insert(id.trim().to_string())
    }

    /// Number of distinct ids under a key
    pub fn count(&self, key: &str) -> usize {
        self.index.get(key).map(|set| set.len()).unwrap_or(0)
    }

    /// Whether an id has been seen under a key
    pub fn contains(&self, key: &str, id: &str) -> bool {
        self.index
            .get(key)
            .map(|set| set.contains(id))
            .unwrap_or(false)
    }

    /// Ids under a key, sorted
    pub fn ids(&self, key: &str) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .index
            .get(key)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    /// All keys that received at least one id
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// Number of distinct ids across every key
    pub fn distinct_total(&self) -> usize {
        self.index
            .values()
            .flat_map(|set| set.iter())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Cardinality per key, in key order
    pub fn counts(&self) -> GroupCounts {
        let mut counts: Vec<GroupCount> = self
            .index
            .iter()
            .map(|(key, ids)| GroupCount::new(key.clone(), ids.len()))
            .collect();
        counts.sort_by(|a, b| a.key.cmp(&b.key));
        GroupCounts::from(counts)
    }
}
