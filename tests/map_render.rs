use carburants::choropleth::{BUCKET_COLORS, NO_DATA_COLOR};
use carburants::map::{InfoBody, LifecycleState};
use carburants::page::{Document, map_figure};
use carburants::{MapController, MapOptions, RegionValue, StaticMap};

const DEPARTMENTS: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {"code": "01", "nom": "Ain"},
     "geometry": {"type": "Polygon", "coordinates": [[[5.0,45.6],[6.1,45.6],[6.1,46.5],[5.0,46.5],[5.0,45.6]]]}},
    {"type": "Feature", "properties": {"code": "2A", "nom": "Corse-du-Sud"},
     "geometry": {"type": "MultiPolygon", "coordinates": [[[[8.5,41.4],[9.4,41.4],[9.4,42.4],[8.5,42.4],[8.5,41.4]]]]}},
    {"type": "Feature", "properties": {"code": "75", "nom": "Paris"},
     "geometry": {"type": "Polygon", "coordinates": [[[2.22,48.81],[2.47,48.81],[2.47,48.90],[2.22,48.90],[2.22,48.81]]]}}
  ]
}"#;

fn values() -> Vec<RegionValue> {
    vec![
        RegionValue::new("1", Some(1.70)).with_info("Prix moyen", "1.700 €"),
        RegionValue::new("2A", Some(1.95)).with_info("Prix moyen", "1.950 €"),
        RegionValue::new("75", None),
    ]
}

#[test]
fn values_set_before_load_are_rendered_after() {
    let mut map = MapController::new(StaticMap::new(), MapOptions::default());
    map.set_values(values(), Some("Prix du Gazole"));
    assert_eq!(map.state(), LifecycleState::Initializing);
    assert!(map.backend().regions().is_empty());
    assert!(map.backend().legend().is_none());

    map.load_regions_geojson(DEPARTMENTS).unwrap();
    assert_eq!(map.state(), LifecycleState::Ready);
    assert_eq!(map.renders(), 1);

    let drawn = map.backend().regions();
    assert_eq!(drawn.len(), 3);
    let fill = |code: &str| {
        drawn
            .iter()
            .find(|r| r.feature.code == code)
            .map(|r| r.style.fill_color.clone())
            .unwrap()
    };
    assert_eq!(fill("01"), BUCKET_COLORS[0]);
    assert_eq!(fill("2A"), BUCKET_COLORS[7]);
    assert_eq!(fill("75"), NO_DATA_COLOR);
    assert_eq!(map.backend().legend().unwrap().title, "Prix du Gazole");
}

#[test]
fn hover_moves_region_to_front_and_fills_info() {
    let mut map = MapController::new(StaticMap::new(), MapOptions::default());
    map.load_regions_geojson(DEPARTMENTS).unwrap();
    map.set_values(values(), Some("Prix du Gazole"));

    assert!(map.hover("01"));
    let drawn = map.backend().regions();
    assert_eq!(drawn.last().unwrap().feature.code, "01");
    assert_eq!(drawn.last().unwrap().style.weight, 5);
    match &map.backend().info().unwrap().body {
        InfoBody::Region { name, info, .. } => {
            assert_eq!(name, "Ain");
            assert_eq!(info["Prix moyen"], "1.700 €");
        }
        other => panic!("unexpected info {:?}", other),
    }

    map.hover_out("01");
    assert_eq!(map.backend().regions().last().unwrap().style.weight, 2);
    assert!(matches!(map.backend().info().unwrap().body, InfoBody::Hint(_)));
}

#[test]
fn svg_and_page_output() {
    let mut map = MapController::new(StaticMap::new(), MapOptions::default());
    map.load_regions_geojson(DEPARTMENTS).unwrap();
    map.set_values(values(), Some("Prix du Gazole"));

    let dir = tempfile::tempdir().unwrap();
    let png_path = dir.path().join("map.png");
    map.backend().render(&png_path, 200, 150).unwrap();
    assert!(std::fs::metadata(&png_path).unwrap().len() > 0);

    map.click("75");
    assert!(map.view().zoom > 5.0);
    map.invalidate();
    let svg_path = dir.path().join("map.svg");
    map.backend().render(&svg_path, 400, 300).unwrap();
    let svg = std::fs::read_to_string(&svg_path).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("<polygon"));

    let mut doc = Document::new("Prix par département");
    doc.push(map_figure(map.backend(), "map", 400, 300).unwrap());
    let html = doc.to_html();
    assert!(html.contains(r#"<div id="map" class="map">"#));
    assert!(html.contains("<svg"));
    assert!(html.contains("Prix du Gazole"));
    assert!(html.contains("© OpenStreetMap"));
    assert_eq!(html.matches("<i style=").count(), 8);
}
