//! Referral hierarchy construction
//!
//! Builds a shallow, fixed-depth tree from flat referral edges:
//!
//! ```text
//! account tree:   root → archetype → tier → account
//! referral tree:  root → referred HCP → affiliated account
//! ```
//!
//! Nodes are emitted depth-first so that every level lists children next to
//! their parent, which is what the column layout relies on.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::record::{is_absent_text, Record, Tier};

/// Label used when an account has no archetype
pub const UNASSIGNED_ARCHETYPE: &str = "Unassigned";

/// Label used when an account has no tier
pub const UNTIERED: &str = "Untiered";

/// One flat referral relationship
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferralEdge {
    /// Referring HCP (name, else id)
    pub referring: Option<String>,
    /// Rendering HCP the patient was referred to (name, else id)
    pub referred_hcp: Option<String>,
    /// Rendering account MDM
    pub account_id: String,
    pub account_name: Option<String>,
    pub archetype: Option<String>,
    pub tier: Option<String>,
    pub patient_id: Option<String>,
}

impl ReferralEdge {
    /// Edge for a record; `None` without a rendering account
    pub fn from_record(record: &Record) -> Option<Self> {
        Some(Self {
            referring: record.ref_hcp_name.clone().or_else(|| record.ref_hcp_id.clone()),
            referred_hcp: record.hcp_name.clone().or_else(|| record.hcp_id.clone()),
            account_id: record.hco_mdm.clone()?,
            account_name: record.hco_name.clone(),
            archetype: record
                .account_archetype
                .clone()
                .or_else(|| record.hco_grouping.clone()),
            tier: record.hco_tier.clone(),
            patient_id: record.patient_id.clone(),
        })
    }

    pub fn from_records(records: &[Record]) -> Vec<Self> {
        records.iter().filter_map(Self::from_record).collect()
    }
}

/// Level a node sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    Archetype,
    Tier,
    Account,
    Hcp,
}

/// A positioned tree node
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    /// Index into [`Hierarchy::nodes`]
    pub id: usize,
    pub label: String,
    pub kind: NodeKind,
    pub level: usize,
    pub parent: Option<usize>,
    /// Distinct patients in this node's subtree
    pub patients: usize,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

/// A parent → child link
#[derive(Debug, Clone, Serialize)]
pub struct Link {
    pub source: usize,
    pub target: usize,
    /// SVG path data, empty until laid out
    pub path: String,
}

/// Nodes and links of a referral tree
#[derive(Debug, Clone, Default, Serialize)]
pub struct Hierarchy {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl Hierarchy {
    /// Number of levels (root counts as one)
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| n.level + 1).max().unwrap_or(0)
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn children(&self, id: usize) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.parent == Some(id))
    }
}

/// Mutable tree under construction
struct TreeBuilder {
    labels: Vec<(String, NodeKind, usize)>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    patients: Vec<HashSet<String>>,
    lookup: HashMap<(usize, String), usize>,
}

impl TreeBuilder {
    fn new(root_label: &str) -> Self {
        Self {
            labels: vec![(root_label.to_string(), NodeKind::Root, 0)],
            parents: vec![None],
            children: vec![Vec::new()],
            patients: vec![HashSet::new()],
            lookup: HashMap::new(),
        }
    }

    /// Find or create a child keyed by `key` under `parent`
    fn child(&mut self, parent: usize, key: &str, label: &str, kind: NodeKind) -> usize {
        if let Some(&idx) = self.lookup.get(&(parent, key.to_string())) {
            return idx;
        }

        let idx = self.labels.len();
        let level = self.labels[parent].2 + 1;
        self.labels.push((label.to_string(), kind, level));
        self.parents.push(Some(parent));
        self.children.push(Vec::new());
        self.patients.push(HashSet::new());
        self.children[parent].push(idx);
        self.lookup.insert((parent, key.to_string()), idx);
        idx
    }

    /// Record a patient on a node and every ancestor
    fn add_patient(&mut self, mut node: usize, patient: Option<&str>) {
        let Some(patient) = patient.filter(|p| !is_absent_text(p)) else {
            return;
        };
        loop {
            self.patients[node].insert(patient.to_string());
            match self.parents[node] {
                Some(parent) => node = parent,
                None => break,
            }
        }
    }

    /// Emit nodes depth-first with children in display order
    fn finish(mut self) -> Hierarchy {
        for idx in 0..self.children.len() {
            let mut kids = std::mem::take(&mut self.children[idx]);
            kids.sort_by(|a, b| {
                let (la, ka, _) = &self.labels[*a];
                let (lb, _, _) = &self.labels[*b];
                match ka {
                    NodeKind::Tier => {
                        let ta = Tier::parse(la);
                        let tb = Tier::parse(lb);
                        (ta.is_none(), ta, la).cmp(&(tb.is_none(), tb, lb))
                    }
                    _ => self.patients[*b]
                        .len()
                        .cmp(&self.patients[*a].len())
                        .then_with(|| la.cmp(lb)),
                }
            });
            self.children[idx] = kids;
        }

        let mut order = Vec::with_capacity(self.labels.len());
        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            order.push(idx);
            stack.extend(self.children[idx].iter().rev());
        }

        let mut new_index = vec![0usize; self.labels.len()];
        for (new, old) in order.iter().enumerate() {
            new_index[*old] = new;
        }

        let nodes: Vec<Node> = order
            .iter()
            .enumerate()
            .map(|(new, &old)| {
                let (label, kind, level) = &self.labels[old];
                Node {
                    id: new,
                    label: label.clone(),
                    kind: *kind,
                    level: *level,
                    parent: self.parents[old].map(|p| new_index[p]),
                    patients: self.patients[old].len(),
                    x: 0.0,
                    y: 0.0,
                    radius: 0.0,
                }
            })
            .collect();

        let links = nodes
            .iter()
            .filter_map(|n| {
                n.parent.map(|p| Link {
                    source: p,
                    target: n.id,
                    path: String::new(),
                })
            })
            .collect();

        Hierarchy { nodes, links }
    }
}

/// Root → archetype → tier → account
pub fn account_tree(root_label: &str, edges: &[ReferralEdge]) -> Hierarchy {
    let mut builder = TreeBuilder::new(root_label);

    for edge in edges {
        let archetype = edge.archetype.as_deref().unwrap_or(UNASSIGNED_ARCHETYPE);
        let tier = edge
            .tier
            .as_deref()
            .and_then(Tier::parse)
            .map(|t| t.to_string())
            .unwrap_or_else(|| UNTIERED.to_string());
        let account_label = edge.account_name.as_deref().unwrap_or(&edge.account_id);

        let a = builder.child(0, archetype, archetype, NodeKind::Archetype);
        let t = builder.child(a, &tier, &tier, NodeKind::Tier);
        let leaf = builder.child(t, &edge.account_id, account_label, NodeKind::Account);
        builder.add_patient(leaf, edge.patient_id.as_deref());
    }

    builder.finish()
}

/// Root → referred HCP → affiliated account
///
/// Edges without a referred HCP are skipped.
pub fn referral_tree(root_label: &str, edges: &[ReferralEdge]) -> Hierarchy {
    let mut builder = TreeBuilder::new(root_label);

    for edge in edges {
        let Some(hcp) = edge.referred_hcp.as_deref() else {
            continue;
        };
        let account_label = edge.account_name.as_deref().unwrap_or(&edge.account_id);

        let h = builder.child(0, hcp, hcp, NodeKind::Hcp);
        let leaf = builder.child(h, &edge.account_id, account_label, NodeKind::Account);
        builder.add_patient(leaf, edge.patient_id.as_deref());
    }

    builder.finish()
}
