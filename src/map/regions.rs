//! Department geometry loaded from a GeoJSON FeatureCollection.

use crate::error::MapError;
use crate::models::normalize_department_code;
use geojson::{GeoJson, Value};
use serde_json::Value as JsonValue;

use super::types::{Bounds, LatLng};

/// Ring of a polygon, closed or not.
pub type Ring = Vec<LatLng>;

/// One department: join key, display name, polygons (outer ring first) and bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionFeature {
    pub code: String,
    pub name: String,
    pub polygons: Vec<Vec<Ring>>,
    pub bounds: Bounds,
}

impl RegionFeature {
    /// Build a feature from polygons; `None` when there is no point at all.
    pub fn new(code: impl Into<String>, name: impl Into<String>, polygons: Vec<Vec<Ring>>) -> Option<Self> {
        let bounds = Bounds::from_points(polygons.iter().flatten().flatten().copied())?;
        Some(Self {
            code: code.into(),
            name: name.into(),
            polygons,
            bounds,
        })
    }
}

fn property_as_string(v: &JsonValue) -> Option<String> {
    match v {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn to_ring(positions: &[Vec<f64>]) -> Ring {
    positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| LatLng::new(p[1], p[0]))
        .collect()
}

/// Parse a departments FeatureCollection. Features without a usable `code` or without
/// polygon geometry are skipped with a warning.
pub fn parse_regions(text: &str) -> Result<Vec<RegionFeature>, MapError> {
    let gj: GeoJson = text.parse()?;
    let fc = match gj {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(MapError::NotAFeatureCollection),
    };

    let mut out = Vec::with_capacity(fc.features.len());
    for (i, feature) in fc.features.iter().enumerate() {
        let raw_code = feature.property("code").and_then(property_as_string);
        let Some(code) = raw_code.as_deref().and_then(normalize_department_code) else {
            log::warn!("feature #{} has no usable department code, skipped", i);
            continue;
        };
        let name = feature
            .property("nom")
            .and_then(property_as_string)
            .unwrap_or_else(|| code.clone());

        let polygons: Vec<Vec<Ring>> = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(Value::Polygon(rings)) => vec![rings.iter().map(|r| to_ring(r)).collect()],
            Some(Value::MultiPolygon(polys)) => polys
                .iter()
                .map(|rings| rings.iter().map(|r| to_ring(r)).collect())
                .collect(),
            _ => {
                log::warn!("department {} has no polygon geometry, skipped", code);
                continue;
            }
        };

        match RegionFeature::new(code.clone(), name, polygons) {
            Some(f) => out.push(f),
            None => log::warn!("department {} has empty geometry, skipped", code),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
      "type": "FeatureCollection",
      "features": [
        {"type": "Feature", "properties": {"code": "01", "nom": "Ain"},
         "geometry": {"type": "Polygon", "coordinates": [[[5.0,46.0],[6.0,46.0],[6.0,46.5],[5.0,46.0]]]}},
        {"type": "Feature", "properties": {"code": "2A", "nom": "Corse-du-Sud"},
         "geometry": {"type": "MultiPolygon", "coordinates": [[[[8.5,41.5],[9.0,41.5],[9.0,42.0],[8.5,41.5]]],[[[8.6,41.3],[8.7,41.3],[8.7,41.4],[8.6,41.3]]]]}},
        {"type": "Feature", "properties": {"nom": "Nowhere"},
         "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}
      ]
    }"#;

    #[test]
    fn parses_polygons_and_multipolygons() {
        let regions = parse_regions(SAMPLE).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].code, "01");
        assert_eq!(regions[0].name, "Ain");
        assert_eq!(regions[0].bounds.south_west, LatLng::new(46.0, 5.0));
        assert_eq!(regions[1].code, "2A");
        assert_eq!(regions[1].polygons.len(), 2);
        assert_eq!(regions[1].bounds.south_west, LatLng::new(41.3, 8.5));
    }

    #[test]
    fn rejects_non_collections() {
        let point = r#"{"type": "Point", "coordinates": [2.0, 46.0]}"#;
        assert!(matches!(
            parse_regions(point),
            Err(MapError::NotAFeatureCollection)
        ));
        assert!(parse_regions("not json").is_err());
    }
}
