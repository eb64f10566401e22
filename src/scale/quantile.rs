//! Quantile color scale
//!
//! Equal-frequency binning: the observed positive counts are split into as
//! many bins as the palette has colors, each bin holding roughly the same
//! number of observations.
//!
//! # Thresholds
//!
//! For `n` colors there are `n - 1` thresholds, the `i/n` quantiles of the
//! sorted domain, interpolated linearly between order statistics (the R-7
//! estimator). A count's rank is the number of thresholds `<=` it.

use serde::Serialize;

use super::palette::Palette;

/// A fitted count → color mapping
#[derive(Debug, Clone, Serialize)]
pub struct QuantileScale {
    /// Sorted, `palette.len() - 1` entries; empty when nothing was fitted
    thresholds: Vec<f64>,
    /// Smallest and largest fitted count
    extent: Option<(f64, f64)>,
    palette: Palette,
}

/// One legend entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendBin {
    pub lower: f64,
    pub upper: f64,
    pub color: String,
}

impl QuantileScale {
    /// Fit a scale over observed counts
    ///
    /// Zero, negative and non-finite counts are ignored. With nothing left
    /// every count maps to the lightest color.
    pub fn fit(counts: &[f64], palette: Palette) -> Self {
        let mut domain: Vec<f64> = counts
            .iter()
            .copied()
            .filter(|c| c.is_finite() && *c > 0.0)
            .collect();
        domain.sort_by(|a, b| a.total_cmp(b));

        if domain.is_empty() {
            return Self {
                thresholds: Vec::new(),
                extent: None,
                palette,
            };
        }

        let n = palette.len();
        let thresholds = (1..n)
            .map(|i| quantile_sorted(&domain, i as f64 / n as f64))
            .collect();
        let extent = Some((domain[0], domain[domain.len() - 1]));

        Self {
            thresholds,
            extent,
            palette,
        }
    }

    /// Fit with the default palette
    pub fn with_default_palette(counts: &[f64]) -> Self {
        Self::fit(counts, Palette::default())
    }

    /// Whether any positive count was observed
    pub fn is_fitted(&self) -> bool {
        self.extent.is_some()
    }

    /// Palette index for a count. NaN counts as absent, +inf as the top bin.
    pub fn rank(&self, count: f64) -> usize {
        if !self.is_fitted() || count.is_nan() || count <= 0.0 {
            return 0;
        }
        if count.is_infinite() {
            return self.thresholds.len();
        }
        self.thresholds.partition_point(|t| *t <= count)
    }

    /// Fill color for a count
    pub fn color(&self, count: f64) -> &str {
        self.palette.at(self.rank(count))
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Count range covered by each color
    pub fn legend(&self) -> Vec<LegendBin> {
        let Some((min, max)) = self.extent else {
            return vec![LegendBin {
                lower: 0.0,
                upper: 0.0,
                color: self.palette.lightest().to_string(),
            }];
        };

        let n = self.palette.len();
        (0..n)
            .map(|i| LegendBin {
                lower: if i == 0 { min } else { self.thresholds[i - 1] },
                upper: if i == n - 1 { max } else { self.thresholds[i] },
                color: self.palette.at(i).to_string(),
            })
            .collect()
    }
}

/// Quantile `p` of an ascending slice, linear interpolation (R-7)
fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[lo] + (sorted[hi] - sorted[lo]) * (h - lo as f64)
}
