//! CSS color strings -> plotters styles.
//!
//! The choropleth palette and Leaflet-style path options carry colors as strings
//! (`"#FD8D3C"`, `"white"`, `"grey"`); this module turns them into `RGBColor` /
//! `ShapeStyle` values for drawing.

use plotters::prelude::*;

use crate::choropleth::RegionStyle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB`, `#RGB` or one of the few named colors the map uses.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return match hex.len() {
                6 => {
                    let v = u32::from_str_radix(hex, 16).ok()?;
                    Some(Self::new((v >> 16) as u8, (v >> 8) as u8, v as u8))
                }
                3 => {
                    let v = u16::from_str_radix(hex, 16).ok()?;
                    let expand = |n: u16| ((n & 0xF) * 17) as u8;
                    Some(Self::new(expand(v >> 8), expand(v >> 4), expand(v)))
                }
                _ => None,
            };
        }
        match s.to_ascii_lowercase().as_str() {
            "white" => Some(Self::new(255, 255, 255)),
            "black" => Some(Self::new(0, 0, 0)),
            "grey" | "gray" => Some(Self::new(128, 128, 128)),
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Unknown names fall back to grey rather than failing a whole render.
pub fn rgb_color(css: &str) -> RGBColor {
    let c = Rgb8::parse(css).unwrap_or(Rgb8::new(128, 128, 128));
    RGBColor(c.r, c.g, c.b)
}

/// Fill of a region polygon, alpha = `fill_opacity`.
pub fn fill_style(style: &RegionStyle) -> ShapeStyle {
    rgb_color(style.fill_color).mix(style.fill_opacity).filled()
}

/// Border of a region polygon.
pub fn stroke_style(style: &RegionStyle) -> ShapeStyle {
    rgb_color(style.color)
        .mix(style.opacity)
        .stroke_width(style.weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_palette_and_names() {
        assert_eq!(Rgb8::parse("#FFEDA0"), Some(Rgb8::new(0xFF, 0xED, 0xA0)));
        assert_eq!(Rgb8::parse("#fff"), Some(Rgb8::new(255, 255, 255)));
        assert_eq!(Rgb8::parse("grey"), Some(Rgb8::new(128, 128, 128)));
        assert_eq!(Rgb8::parse("#12"), None);
        assert_eq!(Rgb8::parse("teal"), None);
        assert_eq!(Rgb8::new(0x80, 0, 0x26).to_hex(), "#800026");
    }
}
