//! Painting GeoJSON boundaries with counts and fill colors

use serde_json::{json, Map, Value};

use crate::aggregate::GroupCounts;
use crate::record::{normalize_zip5, state_code};

use super::quantile::QuantileScale;

/// Property names that carry a state name or code, in lookup order
const STATE_PROPERTIES: [&str; 4] = ["name", "NAME", "STUSPS", "state"];

/// Property names that carry a ZIP/ZCTA code, in lookup order
const ZIP_PROPERTIES: [&str; 5] = ["ZCTA5CE10", "ZCTA5CE20", "GEOID10", "zip", "ZIP"];

/// Resolve a state boundary feature to its two-letter code
pub fn state_key(properties: &Map<String, Value>) -> Option<String> {
    STATE_PROPERTIES
        .iter()
        .filter_map(|p| properties.get(*p).and_then(Value::as_str))
        .find_map(state_code)
        .map(str::to_string)
}

/// Resolve a ZIP boundary feature to its five-digit code
pub fn zip_key(properties: &Map<String, Value>) -> Option<String> {
    ZIP_PROPERTIES
        .iter()
        .filter_map(|p| properties.get(*p).and_then(Value::as_str))
        .find_map(normalize_zip5)
}

/// Annotate each feature with `count` and `fill` properties
///
/// Features whose key has no count get `count = 0` and the lightest color.
/// Returns the number of features that matched a non-zero count.
pub fn paint_boundaries<F>(
    geojson: &mut Value,
    counts: &GroupCounts,
    scale: &QuantileScale,
    key_of: F,
) -> usize
where
    F: Fn(&Map<String, Value>) -> Option<String>,
{
    let lookup = counts.to_map();
    let Some(features) = geojson.get_mut("features").and_then(Value::as_array_mut) else {
        return 0;
    };

    let mut matched = 0;
    for feature in features.iter_mut() {
        let Some(feature) = feature.as_object_mut() else {
            continue;
        };
        let properties = feature
            .entry("properties")
            .or_insert_with(|| Value::Object(Map::new()));
        if !properties.is_object() {
            *properties = Value::Object(Map::new());
        }
        let Some(properties) = properties.as_object_mut() else {
            continue;
        };

        let count = key_of(properties)
            .and_then(|key| lookup.get(&key).copied())
            .unwrap_or(0);
        if count > 0 {
            matched += 1;
        }

        properties.insert("count".to_string(), json!(count));
        properties.insert("fill".to_string(), json!(scale.color(count as f64)));
    }

    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::GroupCount;
    use crate::scale::Palette;

    fn states_geojson() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "California"}, "geometry": null},
                {"type": "Feature", "properties": {"name": "New York"}, "geometry": null},
                {"type": "Feature", "properties": {"name": "Texas"}, "geometry": null},
                {"type": "Feature", "geometry": null}
            ]
        })
    }

    #[test]
    fn test_paint_states() {
        let counts = GroupCounts::from(vec![GroupCount::new("CA", 10), GroupCount::new("NY", 2)]);
        let palette = Palette::new(&["#000001", "#000002"]).unwrap();
        let scale = QuantileScale::fit(&counts.values(), palette);

        let mut geojson = states_geojson();
        let matched = paint_boundaries(&mut geojson, &counts, &scale, state_key);
        assert_eq!(matched, 2);

        let features = geojson["features"].as_array().unwrap();
        assert_eq!(features[0]["properties"]["count"], 10);
        assert_eq!(features[0]["properties"]["fill"], "#000002");
        assert_eq!(features[1]["properties"]["count"], 2);
        assert_eq!(features[1]["properties"]["fill"], "#000001");
        assert_eq!(features[2]["properties"]["count"], 0);
        assert_eq!(features[2]["properties"]["fill"], "#000001");
        assert_eq!(features[3]["properties"]["count"], 0);
    }

    #[test]
    fn test_paint_without_features() {
        let counts = GroupCounts::default();
        let scale = QuantileScale::with_default_palette(&[]);
        let mut geojson = json!({"type": "Topology"});
        assert_eq!(paint_boundaries(&mut geojson, &counts, &scale, state_key), 0);
    }

    #[test]
    fn test_zip_key() {
        let mut props = Map::new();
        props.insert("ZCTA5CE10".to_string(), json!("02115"));
        assert_eq!(zip_key(&props), Some("02115".to_string()));

        let mut props = Map::new();
        props.insert("STUSPS".to_string(), json!("MA"));
        assert_eq!(state_key(&props), Some("MA".to_string()));
        assert_eq!(zip_key(&props), None);
    }
}
