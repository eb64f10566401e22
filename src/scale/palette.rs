//! Choropleth color palettes

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Seven-step sequential blue ramp, lightest first
pub const BLUES: [&str; 7] = [
    "#eff3ff", "#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5", "#084594",
];

/// Five-step sequential orange ramp, lightest first
pub const ORANGES: [&str; 5] = ["#feedde", "#fdbe85", "#fd8d3c", "#e6550d", "#a63603"];

/// An ordered list of colors, lightest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Palette {
    colors: Vec<String>,
}

/// Errors building a palette
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PaletteError {
    #[error("Palette must contain at least one color")]
    Empty,

    #[error("Invalid color {0:?}: expected #rrggbb")]
    InvalidColor(String),
}

impl Palette {
    /// Build a palette from `#rrggbb` strings
    pub fn new<S: AsRef<str>>(colors: &[S]) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::Empty);
        }

        let colors = colors
            .iter()
            .map(|c| {
                let c = c.as_ref().trim();
                let valid = c.len() == 7
                    && c.starts_with('#')
                    && c[1..].chars().all(|ch| ch.is_ascii_hexdigit());
                if valid {
                    Ok(c.to_ascii_lowercase())
                } else {
                    Err(PaletteError::InvalidColor(c.to_string()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { colors })
    }

    pub fn blues() -> Self {
        Self::from_static(&BLUES)
    }

    pub fn oranges() -> Self {
        Self::from_static(&ORANGES)
    }

    /// Look up a built-in palette by name
    pub fn named(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "blues" => Some(Self::blues()),
            "oranges" => Some(Self::oranges()),
            _ => None,
        }
    }

    fn from_static(colors: &[&str]) -> Self {
        Self {
            colors: colors.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// The lightest color (used for regions with no data)
    pub fn lightest(&self) -> &str {
        &self.colors[0]
    }

    /// Color at a rank, clamped to the darkest
    pub fn at(&self, rank: usize) -> &str {
        &self.colors[rank.min(self.colors.len() - 1)]
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[String] {
        &self.colors
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::blues()
    }
}

impl TryFrom<Vec<String>> for Palette {
    type Error = PaletteError;

    fn try_from(colors: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(&colors)
    }
}

impl From<Palette> for Vec<String> {
    fn from(palette: Palette) -> Self {
        palette.colors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_palette() {
        let palette = Palette::default();
        assert_eq!(palette.len(), 7);
        assert_eq!(palette.lightest(), "#eff3ff");
        assert_eq!(palette.at(100), "#084594");
    }

    #[test]
    fn test_palette_validation() {
        assert_eq!(Palette::new::<&str>(&[]), Err(PaletteError::Empty));
        assert_eq!(
            Palette::new(&["#fff"]),
            Err(PaletteError::InvalidColor("#fff".to_string()))
        );
        assert_eq!(
            Palette::new(&["red"]),
            Err(PaletteError::InvalidColor("red".to_string()))
        );

        let palette = Palette::new(&["#FFFFFF", "#000000"]).unwrap();
        assert_eq!(palette.colors(), &["#ffffff", "#000000"]);
    }

    #[test]
    fn test_palette_deserialize_validates() {
        let palette: Palette = serde_json::from_str(r##"["#eeeeee", "#111111"]"##).unwrap();
        assert_eq!(palette.len(), 2);
        assert!(serde_json::from_str::<Palette>("[]").is_err());
    }

    #[test]
    fn test_named_palettes() {
        assert_eq!(Palette::named("Oranges"), Some(Palette::oranges()));
        assert!(Palette::named("rainbow").is_none());
    }
}
