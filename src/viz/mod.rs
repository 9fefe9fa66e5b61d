//! Static map rendering: draw the recorded map state to **SVG** or **PNG**.
//!
//! - [`StaticMap`] implements [`MapBackend`] by keeping the layers it is handed
//! - Regions are drawn in z-order (the hovered one last), filled with their bucket color
//! - Visible markers are drawn as dots, markers with an open popup get a ring
//! - Tiles are not downloaded; the attribution travels with the HTML page instead
//!
//! No text is drawn on the canvas: legend and info panel are HTML overlays
//! (see [`crate::page::document`]).

pub mod color;

use crate::choropleth::RegionStyle;
use crate::map::projection::project;
use crate::map::{InfoPanel, LatLng, Legend, MapBackend, Marker, RegionFeature, StyledRegion, TileLayer};
use anyhow::{Result, anyhow};

use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;

use std::path::Path;

use color::{fill_style, rgb_color, stroke_style};

/// Page background behind the regions (no tiles are drawn).
const BACKGROUND: RGBColor = RGBColor(0xE9, 0xEE, 0xF2);
const MARKER_COLOR: &str = "#1F77B4";
const MARKER_RADIUS: i32 = 5;

/// A region as currently displayed.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRegion {
    pub feature: RegionFeature,
    pub style: RegionStyle,
}

/// Backend that records what the controller shows and renders it with plotters.
#[derive(Debug, Clone)]
pub struct StaticMap {
    center: LatLng,
    zoom: f64,
    tile_layer: Option<TileLayer>,
    regions: Vec<RenderedRegion>,
    legend: Option<Legend>,
    info: Option<InfoPanel>,
    markers: Vec<Marker>,
}

impl Default for StaticMap {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticMap {
    pub fn new() -> Self {
        Self {
            center: LatLng::new(0.0, 0.0),
            zoom: 0.0,
            tile_layer: None,
            regions: Vec::new(),
            legend: None,
            info: None,
            markers: Vec::new(),
        }
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn tile_layer(&self) -> Option<&TileLayer> {
        self.tile_layer.as_ref()
    }

    /// Regions in drawing order, front-most last.
    pub fn regions(&self) -> &[RenderedRegion] {
        &self.regions
    }

    pub fn legend(&self) -> Option<&Legend> {
        self.legend.as_ref()
    }

    pub fn info(&self) -> Option<&InfoPanel> {
        self.info.as_ref()
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Render to a file; `.svg` selects the SVG backend, anything else PNG.
    pub fn render<P: AsRef<Path>>(&self, out_path: P, width: u32, height: u32) -> Result<()> {
        let out_path = out_path.as_ref();
        if out_path.extension().and_then(|s| s.to_str()) == Some("svg") {
            let root = SVGBackend::new(out_path, (width, height)).into_drawing_area();
            draw_scene(root, self, width, height)?;
        } else {
            let root = BitMapBackend::new(out_path, (width, height)).into_drawing_area();
            draw_scene(root, self, width, height)?;
        }
        Ok(())
    }

    /// Render to an SVG document held in memory (for inlining into HTML).
    pub fn render_svg_string(&self, width: u32, height: u32) -> Result<String> {
        let mut buf = String::new();
        {
            let root = SVGBackend::with_string(&mut buf, (width, height)).into_drawing_area();
            draw_scene(root, self, width, height)?;
        }
        Ok(buf)
    }
}

impl MapBackend for StaticMap {
    fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.center = center;
        self.zoom = zoom;
    }

    fn set_tile_layer(&mut self, layer: &TileLayer) {
        self.tile_layer = Some(layer.clone());
    }

    fn set_region_layer(&mut self, regions: &[StyledRegion<'_>]) {
        self.regions = regions
            .iter()
            .map(|r| RenderedRegion {
                feature: r.feature.clone(),
                style: r.style.clone(),
            })
            .collect();
    }

    fn set_region_style(&mut self, code: &str, style: &RegionStyle) {
        if let Some(r) = self.regions.iter_mut().find(|r| r.feature.code == code) {
            r.style = style.clone();
        }
    }

    fn bring_to_front(&mut self, code: &str) {
        if let Some(pos) = self.regions.iter().position(|r| r.feature.code == code) {
            let r = self.regions.remove(pos);
            self.regions.push(r);
        }
    }

    fn set_legend(&mut self, legend: Option<&Legend>) {
        self.legend = legend.cloned();
    }

    fn set_info(&mut self, info: &InfoPanel) {
        self.info = Some(info.clone());
    }

    fn set_markers(&mut self, markers: &[Marker]) {
        self.markers = markers.to_vec();
    }
}

/// Screen transform: global Mercator pixels at the view zoom, centered on the canvas.
struct Screen {
    cx: f64,
    cy: f64,
    half_w: f64,
    half_h: f64,
    zoom: f64,
}

impl Screen {
    fn new(map: &StaticMap, width: u32, height: u32) -> Self {
        let (cx, cy) = project(map.center, map.zoom);
        Self {
            cx,
            cy,
            half_w: width as f64 / 2.0,
            half_h: height as f64 / 2.0,
            zoom: map.zoom,
        }
    }

    fn to_px(&self, p: LatLng) -> (i32, i32) {
        let (x, y) = project(p, self.zoom);
        (
            (x - self.cx + self.half_w).round() as i32,
            (y - self.cy + self.half_h).round() as i32,
        )
    }
}

/// Helper that draws to any Plotters backend.
fn draw_scene<DB>(root: DrawingArea<DB, Shift>, map: &StaticMap, width: u32, height: u32) -> Result<()>
where
    DB: DrawingBackend,
{
    root.fill(&BACKGROUND).map_err(|e| anyhow!("{:?}", e))?;
    let screen = Screen::new(map, width, height);

    for region in &map.regions {
        let fill = fill_style(&region.style);
        let stroke = stroke_style(&region.style);
        for polygon in &region.feature.polygons {
            // Outer ring only; department outlines have no holes worth filling around.
            let Some(outer) = polygon.first() else {
                continue;
            };
            let pts: Vec<(i32, i32)> = outer.iter().map(|p| screen.to_px(*p)).collect();
            if pts.len() < 3 {
                continue;
            }
            root.draw(&Polygon::new(pts.clone(), fill))
                .map_err(|e| anyhow!("{:?}", e))?;
            let mut outline = pts;
            if outline.first() != outline.last() {
                outline.push(outline[0]);
            }
            root.draw(&PathElement::new(outline, stroke))
                .map_err(|e| anyhow!("{:?}", e))?;
        }
    }

    let marker_color = rgb_color(MARKER_COLOR);
    for marker in map.markers.iter().filter(|m| m.visible) {
        let c = screen.to_px(marker.position);
        root.draw(&Circle::new(c, MARKER_RADIUS, marker_color.filled()))
            .map_err(|e| anyhow!("{:?}", e))?;
        if marker.popup_open {
            root.draw(&Circle::new(c, MARKER_RADIUS + 4, BLACK.stroke_width(1)))
                .map_err(|e| anyhow!("{:?}", e))?;
        }
    }

    root.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}
