//! Column layout for referral trees
//!
//! Positions are recomputed from scratch on every call: one column per
//! level, rows spaced evenly within a column, node radius on a square-root
//! scale of patient count, and horizontal Bezier links.

use serde::{Deserialize, Serialize};

use super::tree::Hierarchy;

/// Drawing surface and node sizing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default = "default_margin")]
    pub margin: f64,
    #[serde(default = "default_min_radius")]
    pub min_radius: f64,
    #[serde(default = "default_max_radius")]
    pub max_radius: f64,
}

fn default_width() -> f64 {
    960.0
}

fn default_height() -> f64 {
    600.0
}

fn default_margin() -> f64 {
    40.0
}

fn default_min_radius() -> f64 {
    4.0
}

fn default_max_radius() -> f64 {
    24.0
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            margin: default_margin(),
            min_radius: default_min_radius(),
            max_radius: default_max_radius(),
        }
    }
}

impl LayoutConfig {
    /// Radius for a patient count, given the largest count in the tree
    pub fn radius(&self, patients: usize, max_patients: usize) -> f64 {
        if max_patients == 0 {
            return self.min_radius;
        }
        let t = (patients as f64 / max_patients as f64).sqrt();
        self.min_radius + (self.max_radius - self.min_radius) * t
    }
}

impl Hierarchy {
    /// Assign `x`, `y`, `radius` to every node and a path to every link
    pub fn layout(mut self, config: &LayoutConfig) -> Self {
        let depth = self.depth();
        if depth == 0 {
            return self;
        }

        let inner_w = (config.width - 2.0 * config.margin).max(0.0);
        let inner_h = (config.height - 2.0 * config.margin).max(0.0);
        let column = inner_w / (depth.saturating_sub(1)).max(1) as f64;

        // Nodes are depth-first, so per-level order keeps siblings together
        let mut per_level = vec![0usize; depth];
        for node in &self.nodes {
            per_level[node.level] += 1;
        }

        let max_patients = self.nodes.iter().map(|n| n.patients).max().unwrap_or(0);
        let mut seen = vec![0usize; depth];
        for node in &mut self.nodes {
            let level = node.level;
            let row = seen[level];
            seen[level] += 1;

            // A lone root sits in the middle of the surface
            node.x = if depth == 1 {
                config.width / 2.0
            } else {
                config.margin + level as f64 * column
            };
            node.y = config.margin + (row + 1) as f64 * inner_h / (per_level[level] + 1) as f64;
            node.radius = config.radius(node.patients, max_patients);
        }

        for link in &mut self.links {
            let s = &self.nodes[link.source];
            let t = &self.nodes[link.target];
            link.path = link_path(s.x, s.y, t.x, t.y);
        }

        self
    }
}

/// Horizontal cubic Bezier from source to target
pub fn link_path(sx: f64, sy: f64, tx: f64, ty: f64) -> String {
    let mx = (sx + tx) / 2.0;
    format!(
        "M{:.1},{:.1}C{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}",
        sx, sy, mx, sy, mx, ty, tx, ty
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::tree::{account_tree, ReferralEdge};

    fn edges(n: usize) -> Vec<ReferralEdge> {
        (0..n)
            .map(|i| ReferralEdge {
                referring: None,
                referred_hcp: None,
                account_id: format!("H{}", i),
                account_name: None,
                archetype: Some("Current IV Site".to_string()),
                tier: Some("1".to_string()),
                patient_id: Some(format!("P{}", i)),
            })
            .collect()
    }

    fn config() -> LayoutConfig {
        LayoutConfig {
            width: 340.0,
            height: 440.0,
            margin: 20.0,
            min_radius: 2.0,
            max_radius: 10.0,
        }
    }

    #[test]
    fn test_columns_by_level() {
        let tree = account_tree("Root", &edges(3)).layout(&config());

        // 4 levels over 300px: 100px per column
        let xs: Vec<f64> = tree.nodes.iter().map(|n| n.x).collect();
        assert_eq!(xs, vec![20.0, 120.0, 220.0, 320.0, 320.0, 320.0]);
    }

    #[test]
    fn test_rows_spaced_by_sibling_count() {
        let tree = account_tree("Root", &edges(3)).layout(&config());

        // Single nodes centered; three accounts at quarters of 400px
        assert_eq!(tree.nodes[0].y, 220.0);
        assert_eq!(tree.nodes[1].y, 220.0);
        let ys: Vec<f64> = tree.nodes[3..].iter().map(|n| n.y).collect();
        assert_eq!(ys, vec![120.0, 220.0, 320.0]);
    }

    #[test]
    fn test_radius_sqrt_scale() {
        let c = config();
        assert_eq!(c.radius(0, 0), 2.0);
        assert_eq!(c.radius(0, 16), 2.0);
        assert_eq!(c.radius(16, 16), 10.0);
        assert_eq!(c.radius(4, 16), 6.0);

        let tree = account_tree("Root", &edges(4)).layout(&c);
        assert_eq!(tree.nodes[0].radius, 10.0);
        assert_eq!(tree.nodes[3].radius, 6.0);
    }

    #[test]
    fn test_link_paths() {
        assert_eq!(
            link_path(0.0, 10.0, 100.0, 50.0),
            "M0.0,10.0C50.0,10.0 50.0,50.0 100.0,50.0"
        );

        let tree = account_tree("Root", &edges(2)).layout(&config());
        assert!(tree.links.iter().all(|l| l.path.starts_with('M')));
        assert_eq!(tree.links[0].source, 0);
    }

    #[test]
    fn test_layout_is_recomputed() {
        let once = account_tree("Root", &edges(3)).layout(&config());
        let twice = once.clone().layout(&config());
        let a: Vec<(f64, f64)> = once.nodes.iter().map(|n| (n.x, n.y)).collect();
        let b: Vec<(f64, f64)> = twice.nodes.iter().map(|n| (n.x, n.y)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_lone_root_centered() {
        let tree = account_tree("Root", &[]).layout(&config());
        assert_eq!(tree.nodes[0].x, 170.0);
        assert_eq!(tree.nodes[0].y, 220.0);
    }
}
