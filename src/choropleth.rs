//! Map region values onto the 8-class choropleth palette.
//!
//! - `compute_range` scans defined values once (no-data entries are ignored)
//! - `color_for` buckets a value: `floor((v - min) * 7 / (max - min))`, clamped to `0..=7`
//! - `legend_breakpoints` splits `[min, max]` into 8 equal sub-ranges for the legend
//!
//! A degenerate range (`min == max`) puts every defined value in the last bucket.

use crate::models::RegionValue;
use serde::Serialize;

/// Light to dark (YlOrRd).
pub const BUCKET_COLORS: [&str; 8] = [
    "#FFEDA0", "#FED976", "#FEB24C", "#FD8D3C", "#FC4E2A", "#E31A1C", "#BD0026", "#800026",
];

pub const BUCKET_COUNT: usize = BUCKET_COLORS.len();

/// Fill used for regions without a value, or when no value is defined at all.
pub const NO_DATA_COLOR: &str = "grey";

/// Inclusive range of the defined values. Invariant: `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// `(max - min) / 2`, finite for any finite range.
    fn half_span(&self) -> f64 {
        self.max / 2.0 - self.min / 2.0
    }

    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }

    /// Bucket index of a defined value, clamped to `0..BUCKET_COUNT`.
    pub fn bucket(&self, value: f64) -> usize {
        let last = BUCKET_COUNT - 1;
        if self.is_degenerate() || value >= self.max {
            return last;
        }
        // Halved operands keep the offset finite when max - min overflows.
        let offset = value / 2.0 - self.min / 2.0;
        let raw = (offset / self.half_span() * last as f64).floor();
        if raw.is_nan() || raw <= 0.0 {
            0
        } else {
            (raw as usize).min(last)
        }
    }
}

/// Range over every region whose value is defined, or `None` when none is.
pub fn compute_range<'a, I>(values: I) -> Option<ValueRange>
where
    I: IntoIterator<Item = &'a RegionValue>,
{
    values
        .into_iter()
        .filter_map(|r| r.value)
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some(ValueRange { min: v, max: v }),
            Some(r) => Some(ValueRange {
                min: r.min.min(v),
                max: r.max.max(v),
            }),
        })
}

/// Fill color for a value. Missing value or missing range gives [`NO_DATA_COLOR`].
pub fn color_for(value: Option<f64>, range: Option<&ValueRange>) -> &'static str {
    match (value, range) {
        (Some(v), Some(r)) if v.is_finite() => BUCKET_COLORS[r.bucket(v)],
        _ => NO_DATA_COLOR,
    }
}

/// One legend entry: `[start, end)` drawn with `color`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub start: f64,
    pub end: f64,
    pub color: &'static str,
}

/// `BUCKET_COUNT` contiguous, equal-width sub-ranges spanning `[min, max]`.
pub fn legend_breakpoints(range: &ValueRange) -> Vec<LegendEntry> {
    let step = range.half_span() / (BUCKET_COUNT / 2) as f64;
    BUCKET_COLORS
        .iter()
        .enumerate()
        .map(|(i, color)| {
            let start = range.min + i as f64 * step;
            // Pin the last edge so float drift never leaves max uncovered.
            let end = if i + 1 == BUCKET_COUNT {
                range.max
            } else {
                start + step
            };
            LegendEntry { start, end, color }
        })
        .collect()
}

/// Path style of a region, in Leaflet terms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionStyle {
    pub weight: u32,
    pub opacity: f64,
    pub color: &'static str,
    pub dash_array: Option<&'static str>,
    pub fill_opacity: f64,
    pub fill_color: &'static str,
}

/// Resting style: thin dashed white border over the bucket fill.
pub fn region_style(value: Option<f64>, range: Option<&ValueRange>) -> RegionStyle {
    RegionStyle {
        weight: 2,
        opacity: 1.0,
        color: "white",
        dash_array: Some("3"),
        fill_opacity: 0.8,
        fill_color: color_for(value, range),
    }
}

/// Hover style derived from the resting one: thick solid border, denser fill.
pub fn highlight_style(base: &RegionStyle) -> RegionStyle {
    RegionStyle {
        weight: 5,
        dash_array: None,
        fill_opacity: 0.9,
        ..base.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rv(code: &str, v: Option<f64>) -> RegionValue {
        RegionValue::new(code, v)
    }

    #[test]
    fn range_skips_missing_values() {
        let values = vec![rv("01", Some(1.9)), rv("02", None), rv("03", Some(1.7))];
        let r = compute_range(&values).unwrap();
        assert_eq!(r, ValueRange { min: 1.7, max: 1.9 });
    }

    #[test]
    fn range_is_none_without_defined_values() {
        let values = vec![rv("01", None), rv("02", None)];
        assert!(compute_range(&values).is_none());
        assert_eq!(color_for(None, None), NO_DATA_COLOR);
        assert_eq!(color_for(Some(1.0), None), NO_DATA_COLOR);
    }

    #[test]
    fn endpoints_map_to_first_and_last_bucket() {
        let r = ValueRange { min: 1.5, max: 2.1 };
        assert_eq!(color_for(Some(1.5), Some(&r)), BUCKET_COLORS[0]);
        assert_eq!(color_for(Some(2.1), Some(&r)), BUCKET_COLORS[7]);
        // just below max stays in bucket 6
        assert_eq!(r.bucket(2.099), 6);
    }

    #[test]
    fn extreme_ranges_do_not_overflow() {
        let r = ValueRange { min: -1e308, max: 1e308 };
        assert_eq!(r.bucket(0.0), 3);
        assert_eq!(r.bucket(-1e308), 0);
        assert_eq!(r.bucket(8e307), 6);
        assert_eq!(r.bucket(1e308), 7);
        let legend = legend_breakpoints(&r);
        assert!(legend.iter().all(|e| e.start.is_finite() && e.end.is_finite()));
        assert_eq!(legend[0].start, -1e308);
        assert_eq!(legend[7].end, 1e308);
        assert_eq!(legend[4].start, 0.0);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let r = ValueRange { min: 0.0, max: 7.0 };
        assert_eq!(r.bucket(-3.0), 0);
        assert_eq!(r.bucket(100.0), 7);
    }

    #[test]
    fn degenerate_range_uses_last_bucket() {
        let r = ValueRange { min: 1.8, max: 1.8 };
        assert_eq!(color_for(Some(1.8), Some(&r)), BUCKET_COLORS[7]);
        assert_eq!(color_for(None, Some(&r)), NO_DATA_COLOR);
    }

    #[test]
    fn legend_is_contiguous() {
        let r = ValueRange { min: 1.0, max: 2.6 };
        let legend = legend_breakpoints(&r);
        assert_eq!(legend.len(), BUCKET_COUNT);
        assert_eq!(legend[0].start, 1.0);
        assert_eq!(legend[7].end, 2.6);
        for w in legend.windows(2) {
            assert!((w[0].end - w[1].start).abs() < 1e-12);
            assert!(((w[0].end - w[0].start) - 0.2).abs() < 1e-9);
        }
        assert_eq!(legend[3].color, BUCKET_COLORS[3]);
    }

    #[test]
    fn highlight_keeps_fill() {
        let r = ValueRange { min: 0.0, max: 1.0 };
        let base = region_style(Some(0.5), Some(&r));
        let hi = highlight_style(&base);
        assert_eq!(hi.fill_color, base.fill_color);
        assert_eq!(hi.weight, 5);
        assert_eq!(hi.dash_array, None);
    }
}
