//! SVG path sampling into height-indexed lookup tables.
//!
//! Arc-shaped beams follow a hand-drawn curve. Rather than evaluating the
//! curve per particle per frame, the curve is sampled once into a dense table
//! where the index is the vertical distance (in SVG pixels) above the curve's
//! lowest point and the value is the horizontal offset from the curve's start.
//!
//! ```ignore
//! let table = PathTable::from_svg("M119.9 0 C119.1 44.5 109.7 413 109.7 443.5");
//! let offset = table.offset_at(120.0);
//! ```

use kurbo::{BezPath, ParamCurve, ParamCurveArclen, PathSeg, Point};

/// Number of arc-length steps used when sampling a curve.
pub const DEFAULT_STEPS: usize = 1000;

/// Accuracy passed to kurbo's arc-length solvers.
const ARCLEN_ACCURACY: f64 = 1e-3;

/// Height-indexed table of lateral offsets sampled from a vector curve.
#[derive(Debug, Clone, PartialEq)]
pub struct PathTable {
    lut: Vec<f32>,
    height: f32,
}

impl PathTable {
    /// Table for a degenerate path: a single zero entry and zero height.
    pub fn empty() -> Self {
        Self {
            lut: vec![0.0],
            height: 0.0,
        }
    }

    /// Sample an SVG `d` attribute with [`DEFAULT_STEPS`] steps.
    ///
    /// Malformed input logs a warning and produces [`PathTable::empty`].
    pub fn from_svg(d: &str) -> Self {
        Self::from_svg_with_steps(d, DEFAULT_STEPS)
    }

    /// Sample an SVG `d` attribute with a custom step count.
    pub fn from_svg_with_steps(d: &str, steps: usize) -> Self {
        match BezPath::from_svg(d) {
            Ok(path) => Self::from_bez_path(&path, steps),
            Err(e) => {
                log::warn!("ignoring malformed path ({e}); using a flat table");
                Self::empty()
            }
        }
    }

    /// Sample an already-parsed path.
    pub fn from_bez_path(path: &BezPath, steps: usize) -> Self {
        let segments: Vec<PathSeg> = path.segments().collect();
        if segments.is_empty() || steps == 0 {
            return Self::empty();
        }

        let lengths: Vec<f64> = segments.iter().map(|s| s.arclen(ARCLEN_ACCURACY)).collect();
        let total: f64 = lengths.iter().sum();
        if !total.is_finite() {
            return Self::empty();
        }

        let points: Vec<Point> = (0..=steps)
            .map(|i| point_at_length(&segments, &lengths, total * i as f64 / steps as f64))
            .collect();

        let start_x = points[0].x;
        let (min_y, max_y) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.y), hi.max(p.y))
            });

        let height = max_y - min_y;
        let resolution = height.ceil() as usize;
        let mut lut = vec![0.0f32; resolution + 1];

        for p in &points {
            let dist = (max_y - p.y).floor();
            if dist >= 0.0 && (dist as usize) <= resolution {
                lut[dist as usize] = (p.x - start_x) as f32;
            }
        }

        // Carry the last non-zero offset across indices no sample landed on
        for i in 1..lut.len() {
            if lut[i] == 0.0 && lut[i - 1] != 0.0 {
                lut[i] = lut[i - 1];
            }
        }

        Self {
            lut,
            height: height as f32,
        }
    }

    /// Lateral offset at `px` pixels above the curve's lowest point.
    ///
    /// Negative distances read index 0; distances past the end read the
    /// last entry.
    pub fn offset_at(&self, px: f32) -> f32 {
        let index = px.max(0.0).floor() as usize;
        match self.lut.get(index) {
            Some(v) => *v,
            None => self.lut.last().copied().unwrap_or(0.0),
        }
    }

    /// Vertical extent of the sampled curve in SVG pixels.
    #[inline]
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Number of table entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.lut.len()
    }

    /// Whether the table has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lut.is_empty()
    }

    /// Raw table contents.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.lut
    }
}

impl Default for PathTable {
    fn default() -> Self {
        Self::empty()
    }
}

/// Point at `target` arc length along a chain of segments.
fn point_at_length(segments: &[PathSeg], lengths: &[f64], target: f64) -> Point {
    let mut remaining = target;
    let last = segments.len() - 1;

    for (i, (seg, len)) in segments.iter().zip(lengths).enumerate() {
        if remaining <= *len || i == last {
            let t = if *len > 0.0 {
                seg.inv_arclen(remaining.clamp(0.0, *len), ARCLEN_ACCURACY)
            } else {
                0.0
            };
            return seg.eval(t);
        }
        remaining -= len;
    }

    segments[last].eval(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEFT: &str = "M119.986 0.0078125C119.155 44.5477 109.781 413.008 109.781 443.508C109.781 460.008 103.486 546.947 103.486 558.508C103.486 587.508 95.0459 613.147 59.7812 622.508C-21.2188 644.008 -14.9053 740.008 52.5947 763.008C82.7812 773.294 88.7812 783.008 88.7812 842.008C88.7812 882.408 88.7812 913.841 88.7812 924.508";

    #[test]
    fn test_sampling_is_idempotent() {
        let a = PathTable::from_svg(LEFT);
        let b = PathTable::from_svg(LEFT);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
        assert_eq!(a.height().to_bits(), b.height().to_bits());
    }

    #[test]
    fn test_vertical_line_is_flat() {
        let table = PathTable::from_svg("M0 0 L0 100");
        assert!((table.height() - 100.0).abs() < 1e-3);
        assert_eq!(table.len(), 101);
        assert!(table.as_slice().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_diagonal_line_offsets() {
        // Starts at x=0 (top) and ends at x=50 (bottom)
        let table = PathTable::from_svg("M0 0 L50 100");
        assert!((table.offset_at(0.0) - 50.0).abs() < 0.2);
        assert!((table.offset_at(50.0) - 25.0).abs() < 0.2);
    }

    #[test]
    fn test_gaps_are_forward_filled() {
        let table = PathTable::from_svg_with_steps("M0 0 L30 100", 10);
        // Only 11 samples across 101 entries; no zero holes after the first value
        let lut = table.as_slice();
        let first_nonzero = lut.iter().position(|v| *v != 0.0).unwrap();
        assert!(lut[first_nonzero..].iter().all(|v| *v != 0.0));
    }

    #[test]
    fn test_malformed_path_is_all_zero() {
        let table = PathTable::from_svg("X 1 2");
        assert_eq!(table.height(), 0.0);
        assert!(table.as_slice().iter().all(|v| *v == 0.0));
        assert_eq!(table.offset_at(500.0), 0.0);
    }

    #[test]
    fn test_offset_clamps_past_end() {
        let table = PathTable::from_svg("M0 0 L50 100");
        assert_eq!(table.offset_at(10_000.0), *table.as_slice().last().unwrap());
        assert_eq!(table.offset_at(-5.0), table.offset_at(0.0));
    }

    #[test]
    fn test_curve_height_matches_extent() {
        let table = PathTable::from_svg(LEFT);
        assert!((table.height() - 924.5).abs() < 1.0);
        assert_eq!(table.len(), table.height().ceil() as usize + 1);
    }
}
