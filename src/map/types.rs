//! Public types and constants for the map module.

use crate::choropleth::{LegendEntry, RegionStyle};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::regions::RegionFeature;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Axis-aligned geographic bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl Bounds {
    pub fn new(a: LatLng, b: LatLng) -> Self {
        Self {
            south_west: LatLng::new(a.lat.min(b.lat), a.lng.min(b.lng)),
            north_east: LatLng::new(a.lat.max(b.lat), a.lng.max(b.lng)),
        }
    }

    /// Smallest bounds holding every point, `None` for an empty input.
    pub fn from_points<I: IntoIterator<Item = LatLng>>(points: I) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        let mut b = Bounds::new(first, first);
        for p in it {
            b.extend(p);
        }
        Some(b)
    }

    pub fn extend(&mut self, p: LatLng) {
        self.south_west.lat = self.south_west.lat.min(p.lat);
        self.south_west.lng = self.south_west.lng.min(p.lng);
        self.north_east.lat = self.north_east.lat.max(p.lat);
        self.north_east.lng = self.north_east.lng.max(p.lng);
    }

    pub fn contains(&self, p: LatLng) -> bool {
        p.lat >= self.south_west.lat
            && p.lat <= self.north_east.lat
            && p.lng >= self.south_west.lng
            && p.lng <= self.north_east.lng
    }
}

/// Base raster layer description. The static renderer only keeps the attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

/// Map configuration: initial view, zoom limits, viewport size and marker thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    pub center: LatLng,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Viewport size in CSS pixels (width, height).
    pub viewport_px: (u32, u32),
    pub tile_url: String,
    pub attribution: String,
    /// Markers are shown from this zoom on (inclusive).
    pub marker_zoom: f64,
    /// Popups of in-view markers are opened from this zoom on (inclusive).
    pub popup_zoom: f64,
    /// Title shown in the info panel and legend before any `set_values` call.
    pub title: String,
    /// Info panel text when nothing is hovered.
    pub hint: String,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            center: LatLng::new(46.6309, 2.4527),
            zoom: 5.0,
            min_zoom: 5.0,
            max_zoom: 18.0,
            viewport_px: (800, 600),
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".into(),
            attribution: "© OpenStreetMap".into(),
            marker_zoom: 10.0,
            popup_zoom: 13.0,
            title: "Prix des carburants".into(),
            hint: "Survolez un département".into(),
        }
    }
}

impl MapOptions {
    pub fn tile_layer(&self) -> TileLayer {
        TileLayer {
            url_template: self.tile_url.clone(),
            attribution: self.attribution.clone(),
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom,
        }
    }

    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom.max(self.min_zoom))
    }
}

/// Mutable view state of one map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub center: LatLng,
    pub zoom: f64,
    pub markers_visible: bool,
    pub popups_visible: bool,
    pub highlighted: Option<String>,
}

/// Content of the on-map info overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum InfoBody {
    /// Nothing selected.
    Hint(String),
    Region {
        name: String,
        code: String,
        info: BTreeMap<String, String>,
    },
    Marker(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoPanel {
    pub title: String,
    pub body: InfoBody,
}

impl InfoPanel {
    pub fn hint(title: &str, hint: &str) -> Self {
        Self {
            title: title.to_string(),
            body: InfoBody::Hint(hint.to_string()),
        }
    }

    /// `(label, text)` lines, in display order.
    pub fn lines(&self) -> Vec<(Option<String>, String)> {
        match &self.body {
            InfoBody::Hint(h) => vec![(None, h.clone())],
            InfoBody::Region { name, code, info } => {
                let mut out = vec![(Some("Département".to_string()), format!("{} ({})", name, code))];
                out.extend(info.iter().map(|(k, v)| (Some(k.clone()), v.clone())));
                out
            }
            InfoBody::Marker(text) => vec![(None, text.clone())],
        }
    }
}

/// Legend control: title plus one swatch per bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: String,
    pub entries: Vec<LegendEntry>,
}

/// A region handed to the backend together with its current style.
#[derive(Debug, Clone, Copy)]
pub struct StyledRegion<'a> {
    pub feature: &'a RegionFeature,
    pub style: &'a RegionStyle,
}
