//! HCP and HCO deep dives
//!
//! Both are built from the entity's 360 records, which cover it on either
//! side of a referral. Rendering-side records feed the profile and counts;
//! referring-side records feed the referral tree.

use serde::Serialize;

use crate::aggregate::{
    count_distinct, quarterly_trend, referral_pairs, rollup, Entity, GroupBy, GroupCounts,
    GroupOrder, Totals,
};
use crate::layout::{account_tree, referral_tree, Hierarchy, ReferralEdge};
use crate::record::{Record, Tier};

use super::common::{ViewError, ViewOptions, ViewResult};

fn same_text(field: &Option<String>, wanted: &str) -> bool {
    field
        .as_deref()
        .map(|f| f.trim().eq_ignore_ascii_case(wanted.trim()))
        .unwrap_or(false)
}

fn first<'a, F>(records: &'a [Record], pick: F) -> Option<String>
where
    F: Fn(&'a Record) -> Option<&'a String>,
{
    records.iter().find_map(|r| pick(r)).cloned()
}

/// Prescriber profile card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HcpProfile {
    pub name: String,
    pub id: Option<String>,
    pub specialty: Option<String>,
    pub segment: Option<String>,
    pub state: Option<String>,
}

/// Everything about one prescriber
#[derive(Debug, Clone, Serialize)]
pub struct HcpDeepDive {
    pub profile: HcpProfile,
    /// Over records where the HCP treated
    pub totals: Totals,
    /// Distinct patients this HCP referred to someone else
    pub referred_out: usize,
    /// Affiliated accounts by distinct patients
    pub accounts: GroupCounts,
    pub trend: GroupCounts,
    pub drugs: GroupCounts,
    /// Root → referred HCP → account
    pub network: Hierarchy,
}

impl HcpDeepDive {
    /// `name` matches HCP name (case-insensitive) or id
    pub fn build(records: &[Record], name: &str, options: &ViewOptions) -> ViewResult<Self> {
        let is_hcp = |r: &Record| same_text(&r.hcp_name, name) || same_text(&r.hcp_id, name);
        let is_referrer =
            |r: &Record| same_text(&r.ref_hcp_name, name) || same_text(&r.ref_hcp_id, name);

        let treated: Vec<Record> = records.iter().filter(|r| is_hcp(r)).cloned().collect();
        let referred: Vec<Record> = records.iter().filter(|r| is_referrer(r)).cloned().collect();
        if treated.is_empty() && referred.is_empty() {
            return Err(ViewError::NotFound {
                kind: "HCP",
                key: name.trim().to_string(),
            });
        }

        let display = first(&treated, |r| r.hcp_name.as_ref())
            .or_else(|| first(&referred, |r| r.ref_hcp_name.as_ref()))
            .unwrap_or_else(|| name.trim().to_string());
        let profile = HcpProfile {
            id: first(&treated, |r| r.hcp_id.as_ref())
                .or_else(|| first(&referred, |r| r.ref_hcp_id.as_ref())),
            specialty: first(&treated, |r| r.hcp_specialty.as_ref()),
            segment: treated
                .iter()
                .find_map(|r| r.segment())
                .map(|s| s.label().to_string()),
            state: treated
                .iter()
                .find_map(|r| r.hcp_state_code())
                .map(str::to_string),
            name: display.clone(),
        };

        let referred_out = referred
            .iter()
            .filter(|r| !is_hcp(r))
            .filter_map(|r| r.patient_id.as_deref())
            .collect::<std::collections::HashSet<_>>()
            .len();

        let accounts = count_distinct(
            &treated,
            |r| r.hco_name.as_ref().or(r.hco_mdm.as_ref()),
            |r| r.patient_id.as_ref(),
        )
        .ordered(GroupOrder::CountDesc)
        .top(options.top_n);

        let edges: Vec<ReferralEdge> = ReferralEdge::from_records(&referred)
            .into_iter()
            .filter(|e| {
                e.referred_hcp
                    .as_deref()
                    .map(|h| !h.trim().eq_ignore_ascii_case(display.trim()))
                    .unwrap_or(false)
            })
            .collect();
        let network = referral_tree(&display, &edges).layout(&options.layout);

        Ok(Self {
            totals: Totals::of(&treated),
            referred_out,
            accounts,
            trend: quarterly_trend(&treated, Entity::Patient),
            drugs: rollup(&treated, GroupBy::Drug, Entity::Patient),
            network,
            profile,
        })
    }
}

/// Account profile card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HcoProfile {
    pub mdm: String,
    pub name: Option<String>,
    pub tier: Option<String>,
    pub archetype: Option<String>,
    pub state: Option<String>,
}

/// An account sending patients to the one in focus
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferringAccount {
    pub mdm: String,
    pub name: Option<String>,
    /// Distinct patients referred
    pub patients: usize,
}

impl ReferringAccount {
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.mdm)
    }
}

/// Everything about one account
#[derive(Debug, Clone, Serialize)]
pub struct HcoDeepDive {
    pub profile: HcoProfile,
    /// Over records where the account rendered treatment
    pub totals: Totals,
    /// Rendering HCPs by distinct patients
    pub hcps: GroupCounts,
    /// Referring accounts by distinct patients sent here
    pub referring: Vec<ReferringAccount>,
    pub trend: GroupCounts,
    pub drugs: GroupCounts,
    /// Root → archetype → tier → account this one refers out to
    pub network: Hierarchy,
}

impl HcoDeepDive {
    pub fn build(records: &[Record], mdm: &str, options: &ViewOptions) -> ViewResult<Self> {
        let mdm = mdm.trim();
        let rendering: Vec<Record> = records
            .iter()
            .filter(|r| r.hco_mdm.as_deref() == Some(mdm))
            .cloned()
            .collect();
        let outbound: Vec<Record> = records
            .iter()
            .filter(|r| r.ref_hco_mdm.as_deref() == Some(mdm) && r.hco_mdm.as_deref() != Some(mdm))
            .cloned()
            .collect();
        if rendering.is_empty() && outbound.is_empty() {
            return Err(ViewError::NotFound {
                kind: "HCO",
                key: mdm.to_string(),
            });
        }

        let name = first(&rendering, |r| r.hco_name.as_ref())
            .or_else(|| first(&outbound, |r| r.ref_hco_name.as_ref()));
        let profile = HcoProfile {
            mdm: mdm.to_string(),
            tier: rendering
                .iter()
                .find_map(|r| r.tier())
                .map(|t: Tier| t.to_string()),
            archetype: first(&rendering, |r| {
                r.account_archetype.as_ref().or(r.hco_grouping.as_ref())
            }),
            state: rendering
                .iter()
                .find_map(|r| r.hco_state_code())
                .or_else(|| {
                    outbound.iter().find_map(|r| {
                        r.ref_hco_state
                            .as_deref()
                            .and_then(crate::record::state_code)
                    })
                })
                .map(str::to_string),
            name: name.clone(),
        };

        let hcps = count_distinct(
            &rendering,
            |r| r.hcp_name.as_ref().or(r.hcp_id.as_ref()),
            |r| r.patient_id.as_ref(),
        )
        .ordered(GroupOrder::CountDesc)
        .top(options.top_n);

        // Every rendering record is this account, so pairs are unique per referrer
        let referring: Vec<ReferringAccount> = referral_pairs(&rendering, Entity::Patient)
            .into_iter()
            .filter(|pair| !pair.within_network)
            .take(options.top_n)
            .map(|pair| ReferringAccount {
                mdm: pair.referring_mdm,
                name: pair.referring_name,
                patients: pair.count,
            })
            .collect();

        let root = name.unwrap_or_else(|| mdm.to_string());
        let network =
            account_tree(&root, &ReferralEdge::from_records(&outbound)).layout(&options.layout);

        Ok(Self {
            totals: Totals::of(&rendering),
            hcps,
            referring,
            trend: quarterly_trend(&rendering, Entity::Patient),
            drugs: rollup(&rendering, GroupBy::Drug, Entity::Patient),
            network,
            profile,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::NodeKind;

    fn treatment(hcp: &str, hco: &str, patient: &str, quarter: &str) -> Record {
        Record {
            hcp_name: Some(hcp.to_string()),
            hcp_specialty: Some("Neurology".to_string()),
            hcp_segment: Some("High".to_string()),
            hcp_state: Some("Ohio".to_string()),
            hco_mdm: Some(hco.to_string()),
            hco_name: Some(format!("{} Children's", hco)),
            hco_tier: Some("1".to_string()),
            account_archetype: Some("Current IV Site".to_string()),
            hco_state: Some("OH".to_string()),
            patient_id: Some(patient.to_string()),
            drug_name: Some("Spinraza".to_string()),
            year: Some(2024),
            quarter: Some(quarter.to_string()),
            ..Default::default()
        }
    }

    fn referral(
        from_hcp: &str,
        from_hco: &str,
        to_hcp: &str,
        to_hco: &str,
        patient: &str,
    ) -> Record {
        Record {
            ref_hcp_name: Some(from_hcp.to_string()),
            ref_hco_mdm: Some(from_hco.to_string()),
            ref_hco_name: Some(format!("{} Clinic", from_hco)),
            ref_hco_state: Some("KY".to_string()),
            ..treatment(to_hcp, to_hco, patient, "Q1")
        }
    }

    #[test]
    fn test_hcp_deep_dive() {
        let records = vec![
            treatment("Dr. Ada", "H1", "P1", "Q1"),
            treatment("Dr. Ada", "H1", "P2", "Q2"),
            treatment("Dr. Ada", "H2", "P2", "Q2"),
            referral("Dr. Ada", "H1", "Dr. Bo", "H3", "P3"),
            referral("Dr. Ada", "H1", "Dr. Bo", "H3", "P4"),
        ];
        let view = HcpDeepDive::build(&records, "dr. ada", &ViewOptions::default()).unwrap();

        assert_eq!(view.profile.name, "Dr. Ada");
        assert_eq!(view.profile.segment.as_deref(), Some("High"));
        assert_eq!(view.profile.state.as_deref(), Some("OH"));
        assert_eq!(view.totals.patients, 2);
        assert_eq!(view.totals.hcos, 2);
        assert_eq!(view.referred_out, 2);

        assert_eq!(view.accounts.iter().next().unwrap().key, "H1 Children's");
        assert_eq!(view.trend.get("2024-Q1"), Some(1));
        assert_eq!(view.trend.get("2024-Q2"), Some(1));
        assert_eq!(view.drugs.get("Spinraza"), Some(2));

        // Root → Dr. Bo → H3
        assert_eq!(view.network.nodes.len(), 3);
        assert_eq!(view.network.links.len(), 2);
        assert_eq!(view.network.nodes[1].kind, NodeKind::Hcp);
        assert_eq!(view.network.nodes[0].patients, 2);
        assert!(view.network.links.iter().all(|l| !l.path.is_empty()));
    }

    #[test]
    fn test_referring_accounts_keyed_by_mdm() {
        let mut other = referral("Dr. Eve", "R2", "Dr. Ada", "H1", "P8");
        other.ref_hco_name = Some("R1 Clinic".to_string());
        let records = vec![
            referral("Dr. Cy", "R1", "Dr. Ada", "H1", "P7"),
            referral("Dr. Cy", "R1", "Dr. Ada", "H1", "P9"),
            other,
        ];
        let view = HcoDeepDive::build(&records, "H1", &ViewOptions::default()).unwrap();

        // Same display name, two accounts
        assert_eq!(view.referring.len(), 2);
        assert_eq!(view.referring[0].mdm, "R1");
        assert_eq!(view.referring[0].patients, 2);
        assert_eq!(view.referring[1].mdm, "R2");
        assert_eq!(view.referring[1].label(), "R1 Clinic");
        assert_eq!(view.referring[1].patients, 1);
    }

    #[test]
    fn test_hcp_only_referring() {
        let records = vec![referral("Dr. Cy", "R1", "Dr. Bo", "H3", "P9")];
        let view = HcpDeepDive::build(&records, "Dr. Cy", &ViewOptions::default()).unwrap();
        assert_eq!(view.profile.name, "Dr. Cy");
        assert_eq!(view.totals.patients, 0);
        assert_eq!(view.referred_out, 1);
    }

    #[test]
    fn test_unknown_entities_not_found() {
        let records = vec![treatment("Dr. Ada", "H1", "P1", "Q1")];
        assert_eq!(
            HcpDeepDive::build(&records, "Dr. Nobody", &ViewOptions::default()).unwrap_err(),
            ViewError::NotFound {
                kind: "HCP",
                key: "Dr. Nobody".to_string()
            }
        );
        assert!(HcoDeepDive::build(&records, "H404", &ViewOptions::default()).is_err());
        assert!(HcoDeepDive::build(&[], "H1", &ViewOptions::default()).is_err());
    }

    #[test]
    fn test_hco_deep_dive() {
        let records = vec![
            treatment("Dr. Ada", "H1", "P1", "Q1"),
            treatment("Dr. Bo", "H1", "P2", "Q1"),
            treatment("Dr. Bo", "H1", "P3", "Q3"),
            referral("Dr. Cy", "R1", "Dr. Ada", "H1", "P4"),
            referral("Dr. Ada", "H1", "Dr. Dee", "H7", "P5"),
            referral("Dr. Ada", "H1", "Dr. Ada", "H1", "P6"),
        ];
        let view = HcoDeepDive::build(&records, "H1", &ViewOptions::default()).unwrap();

        assert_eq!(view.profile.name.as_deref(), Some("H1 Children's"));
        assert_eq!(view.profile.tier.as_deref(), Some("Tier 1"));
        assert_eq!(view.profile.archetype.as_deref(), Some("Current IV Site"));

        // P5 was treated at H7, not here
        assert_eq!(view.totals.patients, 5);
        assert_eq!(view.hcps.get("Dr. Bo"), Some(2));
        assert_eq!(view.hcps.get("Dr. Ada"), Some(3));

        // Self-referrals are not listed as referring accounts
        assert_eq!(view.referring.len(), 1);
        assert_eq!(view.referring[0].mdm, "R1");
        assert_eq!(view.referring[0].label(), "R1 Clinic");
        assert_eq!(view.referring[0].patients, 1);

        // Root → archetype → tier → H7
        assert_eq!(view.network.nodes.len(), 4);
        assert_eq!(view.network.links.len(), 3);
        assert_eq!(view.network.nodes[3].label, "H7 Children's");
    }
}
