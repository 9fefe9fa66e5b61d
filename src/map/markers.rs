//! Point markers with zoom-dependent visibility.

use serde::Serialize;

use super::types::{Bounds, LatLng};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub id: usize,
    pub position: LatLng,
    /// Popup text. Popups do not auto-close when another one opens.
    pub short_info: String,
    /// Text pushed to the info panel when the marker is clicked.
    pub long_info: String,
    pub visible: bool,
    pub popup_open: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MarkerGroup {
    markers: Vec<Marker>,
    next_id: usize,
}

impl MarkerGroup {
    pub fn add(&mut self, position: LatLng, short_info: String, long_info: String) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.markers.push(Marker {
            id,
            position,
            short_info,
            long_info,
            visible: false,
            popup_open: false,
        });
        id
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn get(&self, id: usize) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    pub fn as_slice(&self) -> &[Marker] {
        &self.markers
    }

    /// Recompute visibility: markers need `show_markers`; popups additionally need
    /// `open_popups` and the marker inside `viewport`. Returns `(visible, open)` counts.
    pub fn refresh(&mut self, show_markers: bool, open_popups: bool, viewport: &Bounds) -> (usize, usize) {
        let (mut visible, mut open) = (0, 0);
        for m in &mut self.markers {
            m.visible = show_markers;
            m.popup_open = show_markers && open_popups && viewport.contains(m.position);
            visible += m.visible as usize;
            open += m.popup_open as usize;
        }
        (visible, open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_survive_clear() {
        let mut g = MarkerGroup::default();
        let a = g.add(LatLng::new(46.0, 2.0), "a".into(), "A".into());
        g.clear();
        let b = g.add(LatLng::new(46.0, 2.0), "b".into(), "B".into());
        assert_ne!(a, b);
        assert!(g.get(a).is_none());
        assert_eq!(g.get(b).unwrap().short_info, "b");
    }

    #[test]
    fn popups_only_inside_viewport() {
        let mut g = MarkerGroup::default();
        g.add(LatLng::new(46.0, 2.0), "in".into(), String::new());
        g.add(LatLng::new(50.0, 8.0), "out".into(), String::new());
        let view = Bounds::new(LatLng::new(45.0, 1.0), LatLng::new(47.0, 3.0));

        assert_eq!(g.refresh(false, true, &view), (0, 0));
        assert_eq!(g.refresh(true, false, &view), (2, 0));
        assert_eq!(g.refresh(true, true, &view), (2, 1));
        assert!(g.as_slice()[0].popup_open);
        assert!(!g.as_slice()[1].popup_open);
    }
}
