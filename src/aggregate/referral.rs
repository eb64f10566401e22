//! Referral-relationship counts between organizations

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::record::{is_absent_text, Record};

use super::group::Entity;

/// Distinct count for one referring → rendering organization pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferralPair {
    pub referring_mdm: String,
    pub referring_name: Option<String>,
    pub rendering_mdm: String,
    pub rendering_name: Option<String>,
    pub count: usize,
    /// Referring and rendering organization are the same account
    pub within_network: bool,
}

#[derive(Default)]
struct PairAccumulator {
    referring_name: Option<String>,
    rendering_name: Option<String>,
    ids: HashSet<String>,
}

/// Distinct `entity` count per (referring HCO, rendering HCO) pair
///
/// Records missing either organization or the counted id are skipped.
/// Ordered by descending count, ties by referring then rendering MDM.
pub fn referral_pairs(records: &[Record], entity: Entity) -> Vec<ReferralPair> {
    let mut pairs: HashMap<(String, String), PairAccumulator> = HashMap::new();

    for record in records {
        let (Some(referring), Some(rendering), Some(id)) = (
            record.ref_hco_mdm.as_deref(),
            record.hco_mdm.as_deref(),
            entity.id_of(record),
        ) else {
            continue;
        };
        if is_absent_text(id) {
            continue;
        }

        let acc = pairs
            .entry((referring.to_string(), rendering.to_string()))
            .or_default();
        if acc.referring_name.is_none() {
            acc.referring_name = record.ref_hco_name.clone();
        }
        if acc.rendering_name.is_none() {
            acc.rendering_name = record.hco_name.clone();
        }
        acc.ids.insert(id.to_string());
    }

    let mut out: Vec<ReferralPair> = pairs
        .into_iter()
        .map(|((referring_mdm, rendering_mdm), acc)| ReferralPair {
            within_network: referring_mdm == rendering_mdm,
            referring_mdm,
            referring_name: acc.referring_name,
            rendering_mdm,
            rendering_name: acc.rendering_name,
            count: acc.ids.len(),
        })
        .collect();

    out.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.referring_mdm.cmp(&b.referring_mdm))
            .then_with(|| a.rendering_mdm.cmp(&b.rendering_mdm))
    });
    out
}
