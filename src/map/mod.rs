//! Map lifecycle: base layer, department region layer, info panel, legend and markers.
//!
//! The drawing side is abstracted behind [`MapBackend`], so the controller logic runs
//! without any rendering library. [`crate::viz::StaticMap`] is the shipped backend.

pub mod controller;
pub mod markers;
pub mod projection;
pub mod regions;
pub mod types;

pub use controller::{LifecycleState, MapController};
pub use markers::{Marker, MarkerGroup};
pub use regions::{RegionFeature, Ring, parse_regions};
pub use types::{
    Bounds, InfoBody, InfoPanel, LatLng, Legend, MapOptions, StyledRegion, TileLayer, ViewState,
};

use crate::choropleth::RegionStyle;

/// Operations the controller needs from a mapping/rendering library.
pub trait MapBackend {
    fn set_view(&mut self, center: LatLng, zoom: f64);
    /// Replace the base tile layer; a backend shows at most one.
    fn set_tile_layer(&mut self, layer: &TileLayer);
    /// Replace the whole region layer.
    fn set_region_layer(&mut self, regions: &[StyledRegion<'_>]);
    fn set_region_style(&mut self, code: &str, style: &RegionStyle);
    fn bring_to_front(&mut self, code: &str);
    /// `None` removes the legend.
    fn set_legend(&mut self, legend: Option<&Legend>);
    /// Detach the info control and attach it again with new content.
    fn set_info(&mut self, info: &InfoPanel);
    fn set_markers(&mut self, markers: &[Marker]);
}
