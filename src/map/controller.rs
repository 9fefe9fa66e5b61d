use ahash::AHashMap;
use std::collections::BTreeMap;

use crate::choropleth::{RegionStyle, ValueRange, compute_range, highlight_style, legend_breakpoints, region_style};
use crate::error::MapError;
use crate::models::{RegionValue, normalize_department_code};

use super::MapBackend;
use super::markers::{Marker, MarkerGroup};
use super::projection::{fit_bounds, viewport_bounds};
use super::regions::{RegionFeature, parse_regions};
use super::types::{InfoBody, InfoPanel, LatLng, Legend, MapOptions, StyledRegion, ViewState};

/// Lifecycle of the region layer. `Updating` only exists inside `set_values`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Base layers attached, region geometry not loaded yet.
    Initializing,
    /// Region layer rendered and interactive.
    Ready,
}

/// Values received while `Initializing`. Single slot: a newer call replaces an older one.
#[derive(Debug, Clone)]
struct PendingValues {
    values: Vec<RegionValue>,
    title: Option<String>,
}

/// Owns the map state and funnels every mutation through named methods.
///
/// The rendering library is injected as `B: MapBackend`; the controller only tells it
/// what to show.
pub struct MapController<B: MapBackend> {
    backend: B,
    options: MapOptions,
    state: LifecycleState,
    view: ViewState,
    regions: Vec<RegionFeature>,
    index: AHashMap<String, usize>,
    values: BTreeMap<String, RegionValue>,
    styles: Vec<RegionStyle>,
    range: Option<ValueRange>,
    title: String,
    pending: Option<PendingValues>,
    markers: MarkerGroup,
    info: InfoPanel,
    renders: usize,
}

impl<B: MapBackend> MapController<B> {
    /// Attach the base tile layer at the configured center/zoom and an empty region layer.
    pub fn new(backend: B, options: MapOptions) -> Self {
        let zoom = options.clamp_zoom(options.zoom);
        let view = ViewState {
            center: options.center,
            zoom,
            markers_visible: zoom >= options.marker_zoom,
            popups_visible: zoom >= options.popup_zoom,
            highlighted: None,
        };
        let title = options.title.clone();
        let info = InfoPanel::hint(&title, &options.hint);
        let mut ctl = Self {
            backend,
            options,
            state: LifecycleState::Initializing,
            view,
            regions: Vec::new(),
            index: AHashMap::new(),
            values: BTreeMap::new(),
            styles: Vec::new(),
            range: None,
            title,
            pending: None,
            markers: MarkerGroup::default(),
            info,
            renders: 0,
        };
        let layer = ctl.options.tile_layer();
        ctl.backend.set_view(ctl.view.center, ctl.view.zoom);
        ctl.backend.set_tile_layer(&layer);
        ctl.backend.set_region_layer(&[]);
        ctl.backend.set_legend(None);
        ctl.backend.set_info(&ctl.info);
        ctl.backend.set_markers(&[]);
        ctl
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn range(&self) -> Option<ValueRange> {
        self.range
    }

    pub fn info(&self) -> &InfoPanel {
        &self.info
    }

    pub fn markers(&self) -> &[Marker] {
        self.markers.as_slice()
    }

    pub fn regions(&self) -> &[RegionFeature] {
        &self.regions
    }

    /// Current style of a region, if it is loaded.
    pub fn region_style(&self, code: &str) -> Option<&RegionStyle> {
        self.lookup(code).and_then(|i| self.styles.get(i))
    }

    /// Number of completed region-layer renders.
    pub fn renders(&self) -> usize {
        self.renders
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn lookup(&self, code: &str) -> Option<usize> {
        let code = normalize_department_code(code).unwrap_or_else(|| code.to_string());
        self.index.get(&code).copied()
    }

    /// Region geometry arrived: become `Ready` and replay the pending values, or
    /// restyle the new geometry with the values already shown.
    pub fn load_regions(&mut self, regions: Vec<RegionFeature>) {
        self.index = regions
            .iter()
            .enumerate()
            .map(|(i, r)| (r.code.clone(), i))
            .collect();
        self.regions = regions;
        self.state = LifecycleState::Ready;
        match self.pending.take() {
            Some(p) => self.apply_values(p.values, p.title),
            None => {
                let current: Vec<RegionValue> = self.values.values().cloned().collect();
                self.apply_values(current, None);
            }
        }
    }

    /// Parse a departments GeoJSON document, then [`Self::load_regions`].
    pub fn load_regions_geojson(&mut self, text: &str) -> Result<(), MapError> {
        let regions = parse_regions(text)?;
        self.load_regions(regions);
        Ok(())
    }

    /// Replace the displayed values. Before the geometry is loaded the call is parked,
    /// replacing any call parked earlier.
    pub fn set_values<I>(&mut self, values: I, title: Option<&str>)
    where
        I: IntoIterator<Item = RegionValue>,
    {
        let values: Vec<RegionValue> = values.into_iter().collect();
        let title = title.map(str::to_string);
        match self.state {
            LifecycleState::Initializing => {
                if self.pending.is_some() {
                    log::debug!("regions not loaded yet, dropping previous pending values");
                } else {
                    log::debug!("regions not loaded yet, deferring values");
                }
                self.pending = Some(PendingValues { values, title });
            }
            LifecycleState::Ready => self.apply_values(values, title),
        }
    }

    fn apply_values(&mut self, values: Vec<RegionValue>, title: Option<String>) {
        let report_missing = !values.is_empty();
        self.values = values
            .into_iter()
            .map(|mut v| {
                if let Some(code) = normalize_department_code(&v.code) {
                    v.code = code;
                }
                (v.code.clone(), v)
            })
            .collect();
        if let Some(t) = title {
            self.title = t;
        }
        self.range = compute_range(self.values.values());

        let range = self.range.as_ref();
        self.styles = self
            .regions
            .iter()
            .map(|r| match self.values.get(&r.code) {
                Some(v) => region_style(v.value, range),
                None => {
                    if report_missing {
                        log::warn!("no value for department {}, left unstyled", r.code);
                    }
                    region_style(None, range)
                }
            })
            .collect();

        self.push_regions();
        self.push_legend();
        self.view.highlighted = None;
        self.info = self.hint_panel();
        self.backend.set_info(&self.info);
        self.renders += 1;
    }

    fn hint_panel(&self) -> InfoPanel {
        InfoPanel::hint(&self.title, &self.options.hint)
    }

    fn push_regions(&mut self) {
        let styled: Vec<StyledRegion<'_>> = self
            .regions
            .iter()
            .zip(&self.styles)
            .map(|(feature, style)| StyledRegion { feature, style })
            .collect();
        self.backend.set_region_layer(&styled);
    }

    fn push_legend(&mut self) {
        let legend = self.range.as_ref().map(|r| Legend {
            title: self.title.clone(),
            entries: legend_breakpoints(r),
        });
        self.backend.set_legend(legend.as_ref());
    }

    /// Pointer entered a region: emphasize it and show its details.
    pub fn hover(&mut self, code: &str) -> bool {
        let Some(i) = self.lookup(code) else {
            log::warn!("hover on unknown department {}", code);
            return false;
        };
        if let Some(prev) = self.view.highlighted.clone() {
            if prev != self.regions[i].code {
                self.hover_out(&prev);
            }
        }
        let region = &self.regions[i];
        let style = highlight_style(&self.styles[i]);
        self.backend.set_region_style(&region.code, &style);
        self.backend.bring_to_front(&region.code);

        let info = self
            .values
            .get(&region.code)
            .map(|v| v.info.clone())
            .unwrap_or_default();
        self.info = InfoPanel {
            title: self.title.clone(),
            body: InfoBody::Region {
                name: region.name.clone(),
                code: region.code.clone(),
                info,
            },
        };
        self.view.highlighted = Some(region.code.clone());
        self.backend.set_info(&self.info);
        true
    }

    /// Pointer left a region: restore its resting style and the default message.
    pub fn hover_out(&mut self, code: &str) -> bool {
        let Some(i) = self.lookup(code) else {
            return false;
        };
        let code = self.regions[i].code.clone();
        self.backend.set_region_style(&code, &self.styles[i]);
        if self.view.highlighted.as_deref() == Some(code.as_str()) {
            self.view.highlighted = None;
            self.info = self.hint_panel();
            self.backend.set_info(&self.info);
        }
        true
    }

    /// Zoom/pan so that the clicked region fills the viewport.
    pub fn click(&mut self, code: &str) -> bool {
        let Some(i) = self.lookup(code) else {
            log::warn!("click on unknown department {}", code);
            return false;
        };
        let (center, zoom) = fit_bounds(
            &self.regions[i].bounds,
            self.options.viewport_px,
            self.options.min_zoom,
            self.options.max_zoom,
        );
        self.move_view(center, zoom);
        true
    }

    /// `zoomend` handler.
    pub fn on_zoom_end(&mut self, zoom: f64) {
        let center = self.view.center;
        self.move_view(center, zoom);
    }

    /// `dragend` handler.
    pub fn on_drag_end(&mut self, center: LatLng) {
        let zoom = self.view.zoom;
        self.move_view(center, zoom);
    }

    fn move_view(&mut self, center: LatLng, zoom: f64) {
        self.view.center = center;
        self.view.zoom = self.options.clamp_zoom(zoom);
        self.backend.set_view(self.view.center, self.view.zoom);
        self.refresh_markers();
    }

    pub fn add_marker(&mut self, lat: f64, lon: f64, short_info: &str, long_info: &str) -> usize {
        let id = self.markers.add(
            LatLng::new(lat, lon),
            short_info.to_string(),
            long_info.to_string(),
        );
        self.refresh_markers();
        id
    }

    /// Show the marker's long description in the info panel.
    pub fn click_marker(&mut self, id: usize) -> bool {
        let Some(marker) = self.markers.get(id) else {
            return false;
        };
        self.info = InfoPanel {
            title: self.title.clone(),
            body: InfoBody::Marker(marker.long_info.clone()),
        };
        self.backend.set_info(&self.info);
        true
    }

    pub fn clear_markers(&mut self) {
        self.markers.clear();
        self.backend.set_markers(&[]);
    }

    fn refresh_markers(&mut self) {
        self.view.markers_visible = self.view.zoom >= self.options.marker_zoom;
        self.view.popups_visible = self.view.zoom >= self.options.popup_zoom;
        let viewport = viewport_bounds(self.view.center, self.view.zoom, self.options.viewport_px);
        let (visible, open) =
            self.markers
                .refresh(self.view.markers_visible, self.view.popups_visible, &viewport);
        log::debug!(
            "zoom {}: {} markers visible, {} popups open",
            self.view.zoom,
            visible,
            open
        );
        self.backend.set_markers(self.markers.as_slice());
    }

    /// Push the complete current state to the backend again.
    pub fn invalidate(&mut self) {
        let layer = self.options.tile_layer();
        self.backend.set_view(self.view.center, self.view.zoom);
        self.backend.set_tile_layer(&layer);
        self.push_regions();
        if let Some(code) = self.view.highlighted.clone() {
            if let Some(i) = self.lookup(&code) {
                let style = highlight_style(&self.styles[i]);
                self.backend.set_region_style(&code, &style);
                self.backend.bring_to_front(&code);
            }
        }
        self.push_legend();
        self.backend.set_info(&self.info);
        self.refresh_markers();
    }
}
