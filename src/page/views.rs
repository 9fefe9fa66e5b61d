//! Page entry points: reshape one JSON resource and render it once.
//!
//! - [`statistics_view`] prints the sale-point count
//! - [`averages_view`] lists the national average per fuel in the `#averages` table
//! - [`departments_view`] drives the department choropleth from a fuel selector
//! - [`sale_points_view`] drives the sale-point markers from a fuel selector
//!
//! The map views return the controller so callers can keep interacting with it
//! (hover, zoom, drag) before rendering.

use anyhow::Result;
use num_format::{Locale, ToFormattedString};

use crate::error::{FetchError, PageError};
use crate::map::{MapBackend, MapController, MapOptions, RegionFeature};
use crate::models::{Metrics, PRICE_OFFSET, RegionValue, SalePoints};
use crate::viz::StaticMap;

use super::document::{map_element, popups_element};
use super::dom::Element;
use super::selector::Selector;
use super::table::{map_prices_to_names, populate_table_with_header};

/// A rendered selector plus the map it drives.
pub struct MapView<B: MapBackend> {
    pub selector: Element,
    pub controller: MapController<B>,
    /// Label of the selected fuel, if any option exists.
    pub fuel: Option<String>,
}

/// Log a failed fetch before handing the error back; nothing gets rendered after it.
pub fn log_fetch<T>(what: &str, result: Result<T, FetchError>) -> Result<T, FetchError> {
    result.inspect_err(|e| log::error!("failed to fetch {}: {}", what, e))
}

/// `<p id="statistics">Il y a 12 345 points de vente.</p>`
pub fn statistics_view(sale_points: &SalePoints) -> Element {
    let count = sale_points.len().to_formatted_string(&Locale::fr);
    Element::new("p")
        .with_id("statistics")
        .with_text(&format!("Il y a {} points de vente.", count))
}

/// Section holding the `#averages` table, filled with the national averages.
pub fn averages_view(metrics: &Metrics) -> Result<Element, PageError> {
    let mut section = Element::new("section")
        .with_id("prices")
        .with_child(Element::new("h2").with_text("Prix moyens"))
        .with_child(Element::new("table").with_id("averages"));
    populate_averages(&mut section, metrics)?;
    Ok(section)
}

/// Fill the `#averages` table found under `page`: one row per fuel that has a
/// national average (3 decimals), after a header row.
pub fn populate_averages(page: &mut Element, metrics: &Metrics) -> Result<(), PageError> {
    let table = page
        .find_by_id_mut("averages")
        .ok_or_else(|| PageError::MissingElement("averages".to_string()))?;
    let mut rows = vec![vec!["Carburant".to_string(), "Prix moyen".to_string()]];
    rows.extend(
        map_prices_to_names(&metrics.averages_global, &metrics.fuel_types)
            .into_iter()
            .map(|(name, price)| vec![name, format!("{:.3}", price)]),
    );
    populate_table_with_header(table, rows);
    Ok(())
}

/// Region values of one fuel: the average plus the info shown on hover.
pub fn department_values(metrics: &Metrics, fuel_idx: usize) -> Vec<RegionValue> {
    let fuel_name = metrics
        .fuel_types
        .iter()
        .nth(fuel_idx)
        .map(|f| f.name.clone())
        .unwrap_or_default();
    metrics
        .department_averages(fuel_idx)
        .into_iter()
        .map(|(code, avg)| {
            let mut value = RegionValue::new(code, avg);
            if let Some(avg) = avg {
                value = value.with_info("Prix moyen", format!("{:.3} €", avg));
            }
            value.with_info("Carburant", fuel_name.clone())
        })
        .collect()
}

/// Fuel selector over the metrics catalog driving a department choropleth.
///
/// The selection is applied before the geometry is loaded, the way the page does it
/// while the GeoJSON request is in flight; the controller replays it on load.
/// `fuel` picks the initial option (id or name); `None` picks the first one.
pub fn departments_view<B: MapBackend>(
    metrics: &Metrics,
    regions: Vec<RegionFeature>,
    backend: B,
    fuel: Option<&str>,
    options: MapOptions,
) -> Result<MapView<B>, PageError> {
    let initial = match fuel {
        Some(f) => Some(
            metrics
                .fuel_types
                .position(f)
                .ok_or_else(|| PageError::UnknownFuel(f.to_string()))?,
        ),
        None => (!metrics.fuel_types.is_empty()).then_some(0),
    };

    let mut controller = MapController::new(backend, options);
    let container = Element::new("div").with_id("fuel-types").with_class("selector");
    let mut selector = Selector::build(container, metrics.fuel_types.names(), |e| {
        let values = department_values(metrics, e.index);
        controller.set_values(values, Some(format!("Prix du {}", e.label).as_str()));
    });
    if let Some(i) = initial {
        selector.click(i)?;
    }
    let fuel = selector.active().map(str::to_string);
    let selector = selector.into_element();

    controller.load_regions(regions);
    Ok(MapView {
        selector,
        controller,
        fuel,
    })
}

/// Fuel selector over the sale-point columns driving one marker per selling point.
pub fn sale_points_view<B: MapBackend>(
    sale_points: &SalePoints,
    backend: B,
    fuel: Option<&str>,
    options: MapOptions,
) -> Result<MapView<B>, PageError> {
    let names = sale_points.fuel_names();
    let initial = match fuel {
        Some(f) => Some(
            names
                .iter()
                .position(|n| n.eq_ignore_ascii_case(f))
                .ok_or_else(|| PageError::UnknownFuel(f.to_string()))?,
        ),
        None => (!names.is_empty()).then_some(0),
    };

    let mut controller = MapController::new(backend, options);
    // No region layer on this page.
    controller.load_regions(Vec::new());

    let container = Element::new("div").with_id("fuel-types").with_class("selector");
    let mut selector = Selector::build(container, names, |e| {
        controller.clear_markers();
        let mut added = 0usize;
        for (point, price) in sale_points.priced_at(PRICE_OFFSET + e.index) {
            let short = format!("{:.2} €", price);
            let long = format!(
                "{:.2} € - {}, {}, {}",
                price, point.city, point.street, point.postcode
            );
            controller.add_marker(point.latitude, point.longitude, &short, &long);
            added += 1;
        }
        log::info!("{} sale points sell {}", added, e.label);
    });
    if let Some(i) = initial {
        selector.click(i)?;
    }
    let fuel = selector.active().map(str::to_string);
    let selector = selector.into_element();

    Ok(MapView {
        selector,
        controller,
        fuel,
    })
}

/// Map figure for a [`StaticMap`]: inline SVG, overlays, open popups and attribution.
pub fn map_figure(map: &StaticMap, id: &str, width: u32, height: u32) -> Result<Element> {
    let svg = map.render_svg_string(width, height)?;
    let mut figure = map_element(
        id,
        &svg,
        map.info(),
        map.legend(),
        map.tile_layer().map(|t| t.attribution.as_str()),
    );
    if let Some(popups) = popups_element(map.markers()) {
        figure.push(popups);
    }
    Ok(figure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choropleth::{BUCKET_COLORS, NO_DATA_COLOR};
    use crate::map::{LatLng, LifecycleState};
    use crate::models::FuelCatalog;

    fn metrics() -> Metrics {
        Metrics {
            fuel_types: FuelCatalog::from_pairs([("1", "Gazole"), ("2", "SP95")]),
            departments: vec!["01".into(), "02".into()],
            averages_global: vec![Some(1.8), None],
            averages_by_departments: vec![vec![Some(1.7), Some(1.9)], vec![None, Some(2.0)]],
        }
    }

    fn square(code: &str, lat: f64) -> RegionFeature {
        let ring = vec![
            LatLng::new(lat, 2.0),
            LatLng::new(lat, 3.0),
            LatLng::new(lat + 1.0, 3.0),
            LatLng::new(lat, 2.0),
        ];
        RegionFeature::new(code, code.to_string(), vec![vec![ring]]).unwrap()
    }

    #[test]
    fn averages_table_has_header_and_rounded_prices() {
        let section = averages_view(&metrics()).unwrap();
        let table = section.find_by_id("averages").unwrap();
        let rows: Vec<String> = table.elements().map(|r| r.text_content()).collect();
        assert_eq!(rows, vec!["CarburantPrix moyen", "Gazole1.800"]);
    }

    #[test]
    fn averages_need_their_table() {
        let mut page = Element::new("main").with_child(Element::new("table").with_id("other"));
        let err = populate_averages(&mut page, &metrics()).unwrap_err();
        assert_eq!(err, PageError::MissingElement("averages".into()));
        assert_eq!(page.find_by_id("other").unwrap().elements().count(), 0);
    }

    #[test]
    fn departments_view_colors_selected_fuel() {
        let regions = vec![square("01", 45.0), square("02", 48.0)];
        let view = departments_view(
            &metrics(),
            regions,
            StaticMap::new(),
            Some("SP95"),
            MapOptions::default(),
        )
        .unwrap();
        assert_eq!(view.fuel.as_deref(), Some("SP95"));
        assert_eq!(view.controller.state(), LifecycleState::Ready);
        assert_eq!(view.controller.renders(), 1);
        assert_eq!(view.controller.region_style("01").unwrap().fill_color, NO_DATA_COLOR);
        assert_eq!(view.controller.region_style("02").unwrap().fill_color, BUCKET_COLORS[7]);
        let legend = view.controller.backend().legend().unwrap();
        assert_eq!(legend.title, "Prix du SP95");
        let active: Vec<bool> = view.selector.elements().map(|b| b.has_class("active")).collect();
        assert_eq!(active, vec![false, true]);
    }

    #[test]
    fn unknown_fuel_renders_nothing() {
        let err = departments_view(
            &metrics(),
            Vec::new(),
            StaticMap::new(),
            Some("GPL"),
            MapOptions::default(),
        )
        .err();
        assert_eq!(err, Some(PageError::UnknownFuel("GPL".into())));
    }
}
