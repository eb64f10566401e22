//! Choropleth Color Scaling
//!
//! Maps per-region counts onto an ordered palette by quantile (equal
//! frequency) binning, and paints GeoJSON boundaries with the result.
//!
//! - [`Palette`]: ordered colors, lightest first
//! - [`QuantileScale`]: fitted count → color function
//! - [`paint_boundaries`]: annotate GeoJSON features with `count` and `fill`

mod boundaries;
mod palette;
mod quantile;

pub use boundaries::{paint_boundaries, state_key, zip_key};
pub use palette::{Palette, PaletteError, BLUES, ORANGES};
pub use quantile::{LegendBin, QuantileScale};
