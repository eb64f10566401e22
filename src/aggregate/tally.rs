//! Multi-entity tallies
//!
//! Map tooltips and KPI cards show patients, HCPs and HCOs side by side, so
//! these are counted in one pass with one [`DistinctIndex`] per entity.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::record::{Record, TerritoryMap};

use super::distinct::DistinctIndex;
use super::group::{Entity, GroupBy};

/// Distinct patients, HCPs and HCOs under one key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityTally {
    pub key: String,
    pub patients: usize,
    pub hcps: usize,
    pub hcos: usize,
}

impl EntityTally {
    /// The count for one entity kind
    pub fn get(&self, entity: Entity) -> usize {
        match entity {
            Entity::Patient => self.patients,
            Entity::Hcp => self.hcps,
            Entity::Hco => self.hcos,
        }
    }
}

/// Distinct totals over a whole record set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub patients: usize,
    pub hcps: usize,
    pub hcos: usize,
}

impl Totals {
    pub fn of(records: &[Record]) -> Self {
        let count = |entity: Entity| {
            records
                .iter()
                .filter_map(|r| entity.id_of(r))
                .filter(|id| !crate::record::is_absent_text(id))
                .collect::<BTreeSet<_>>()
                .len()
        };

        Self {
            patients: count(Entity::Patient),
            hcps: count(Entity::Hcp),
            hcos: count(Entity::Hco),
        }
    }
}

/// Tally every entity kind per group key
///
/// Keys appear if any entity was counted under them. Rows are ordered by
/// descending `order_by` count, ties by key.
pub fn tally_by(
    records: &[Record],
    group: GroupBy,
    territories: Option<&TerritoryMap>,
    order_by: Entity,
) -> Vec<EntityTally> {
    let mut patients = DistinctIndex::new();
    let mut hcps = DistinctIndex::new();
    let mut hcos = DistinctIndex::new();

    for record in records {
        let Some(key) = group.key(record, territories) else {
            continue;
        };
        if let Some(id) = Entity::Patient.id_of(record) {
            patients.add(&key, id);
        }
        if let Some(id) = Entity::Hcp.id_of(record) {
            hcps.add(&key, id);
        }
        if let Some(id) = Entity::Hco.id_of(record) {
            hcos.add(&key, id);
        }
    }

    let keys: BTreeSet<&str> = patients
        .keys()
        .chain(hcps.keys())
        .chain(hcos.keys())
        .collect();

    let mut rows: Vec<EntityTally> = keys
        .into_iter()
        .map(|key| EntityTally {
            key: key.to_string(),
            patients: patients.count(key),
            hcps: hcps.count(key),
            hcos: hcos.count(key),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.get(order_by)
            .cmp(&a.get(order_by))
            .then_with(|| a.key.cmp(&b.key))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(state: &str, patient: &str, hcp: &str, hco: &str) -> Record {
        Record {
            hco_state: Some(state.to_string()),
            patient_id: Some(patient.to_string()),
            hcp_id: Some(hcp.to_string()),
            hco_mdm: Some(hco.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_totals() {
        let records = vec![
            record("CA", "P1", "D1", "H1"),
            record("CA", "P1", "D2", "H1"),
            record("NY", "P2", "D2", "H2"),
            Record::default(),
        ];

        let totals = Totals::of(&records);
        assert_eq!(
            totals,
            Totals {
                patients: 2,
                hcps: 2,
                hcos: 2
            }
        );
        assert_eq!(Totals::of(&[]), Totals::default());
    }

    #[test]
    fn test_tally_by_state() {
        let records = vec![
            record("CA", "P1", "D1", "H1"),
            record("CA", "P2", "D1", "H1"),
            record("CA", "P2", "D2", "H2"),
            record("NY", "P3", "D3", "H3"),
            record("-", "P4", "D4", "H4"),
        ];

        let rows = tally_by(&records, GroupBy::State, None, Entity::Patient);
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            EntityTally {
                key: "CA".to_string(),
                patients: 2,
                hcps: 2,
                hcos: 2
            }
        );
        assert_eq!(rows[1].key, "NY");
        assert_eq!(rows[1].get(Entity::Hco), 1);
    }

    #[test]
    fn test_tally_keeps_keys_with_partial_entities() {
        let records = vec![Record {
            hco_state: Some("TX".to_string()),
            hco_mdm: Some("H9".to_string()),
            ..Default::default()
        }];

        let rows = tally_by(&records, GroupBy::State, None, Entity::Hco);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].patients, 0);
        assert_eq!(rows[0].hcos, 1);
    }
}
