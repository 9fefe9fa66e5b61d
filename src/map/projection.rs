//! Spherical Web Mercator, as used by slippy-map tiles.

use super::types::{Bounds, LatLng};
use std::f64::consts::PI;

pub const TILE_SIZE: f64 = 256.0;
const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// Project to global pixel coordinates at `zoom` (y grows southwards).
pub fn project(p: LatLng, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let lat = p.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (p.lng + 180.0) / 360.0 * size;
    let y = (0.5 - ((1.0 + lat.sin()) / (1.0 - lat.sin())).ln() / (4.0 * PI)) * size;
    (x, y)
}

pub fn unproject(x: f64, y: f64, zoom: f64) -> LatLng {
    let size = world_size(zoom);
    let lng = x / size * 360.0 - 180.0;
    let n = PI - 2.0 * PI * y / size;
    let lat = n.sinh().atan().to_degrees();
    LatLng::new(lat, lng)
}

/// Geographic bounds visible in a `size_px` viewport centered on `center`.
pub fn viewport_bounds(center: LatLng, zoom: f64, size_px: (u32, u32)) -> Bounds {
    let (cx, cy) = project(center, zoom);
    let (hw, hh) = (size_px.0 as f64 / 2.0, size_px.1 as f64 / 2.0);
    Bounds::new(
        unproject(cx - hw, cy + hh, zoom),
        unproject(cx + hw, cy - hh, zoom),
    )
}

/// Center and the largest integer zoom in `[min_zoom, max_zoom]` at which `bounds` fits.
pub fn fit_bounds(
    bounds: &Bounds,
    size_px: (u32, u32),
    min_zoom: f64,
    max_zoom: f64,
) -> (LatLng, f64) {
    let (x0, y0) = project(bounds.south_west, 0.0);
    let (x1, y1) = project(bounds.north_east, 0.0);
    let center = unproject((x0 + x1) / 2.0, (y0 + y1) / 2.0, 0.0);

    let (w0, h0) = ((x1 - x0).abs(), (y1 - y0).abs());
    let lo = min_zoom.ceil() as i32;
    let hi = max_zoom.floor() as i32;
    let mut zoom = lo;
    for z in (lo..=hi).rev() {
        let scale = 2f64.powi(z);
        if w0 * scale <= size_px.0 as f64 && h0 * scale <= size_px.1 as f64 {
            zoom = z;
            break;
        }
    }
    (center, zoom as f64)
}
