//! Rectangle and colour primitives shared by detection and matching.
//!
//! All rectangles live in top-down page space: `y` grows from the top edge
//! of the page, matching the glyph coordinate convention of the source
//! layer. Degenerate (zero-area) rectangles are valid values; they simply
//! never overlap anything.

/// An axis-aligned rectangle in top-down page coordinates.
///
/// Invariant: `x1 >= x0` and `y1 >= y0` for rectangles produced by this
/// crate. `overlap_ratio` tolerates violations by treating them as empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        (self.x1 - self.x0).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y1 - self.y0).max(0.0)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Intersection of two rectangles, or `None` when they are disjoint.
    ///
    /// Edge-touching rectangles are considered disjoint: the shared border
    /// has zero area and contributes nothing to an overlap ratio.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x0.max(other.x0);
        let y0 = self.y0.max(other.y0);
        let x1 = self.x1.min(other.x1);
        let y1 = self.y1.min(other.y1);
        if x0 >= x1 || y0 >= y1 {
            None
        } else {
            Some(Rect::new(x0, y0, x1, y1))
        }
    }
}

/// An RGB fill colour with channels in `[0, 1]`.
pub type Color = (f64, f64, f64);

/// Fraction of `b`'s area covered by `a`.
///
/// The denominator is always the *second* argument's area, so the ratio is
/// asymmetric: callers pass the smaller, possibly-contained shape (the
/// glyph) as `b`. Returns 0.0 for disjoint rectangles and for a degenerate
/// `b`.
pub fn overlap_ratio(a: &Rect, b: &Rect) -> f64 {
    let b_area = b.area();
    if b_area == 0.0 {
        return 0.0;
    }
    match a.intersection(b) {
        Some(i) => i.area() / b_area,
        None => 0.0,
    }
}

/// Whether a fill colour is dark enough to count as a redaction fill.
///
/// True iff all three channels are at or below `threshold`. No colour-space
/// conversion is applied; redaction fills are near-pure black or dark gray
/// in practice, so a per-channel cutoff is sufficient.
pub fn is_dark(color: Color, threshold: f64) -> bool {
    let (r, g, b) = color;
    r <= threshold && g <= threshold && b <= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disjoint_rects_never_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        for (dx, dy) in [(20.0, 0.0), (0.0, 20.0), (-30.0, -30.0), (100.0, 5.0)] {
            let b = Rect::new(dx, dy, dx + 5.0, dy + 5.0);
            assert_eq!(overlap_ratio(&a, &b), 0.0);
            assert_eq!(overlap_ratio(&b, &a), 0.0);
        }
    }

    #[test]
    fn test_contained_rect_has_full_ratio() {
        let outer = Rect::new(0.0, 0.0, 100.0, 20.0);
        let inner = Rect::new(10.0, 5.0, 20.0, 15.0);
        assert_eq!(overlap_ratio(&outer, &inner), 1.0);
        // The reverse direction divides by the outer area instead.
        assert!(overlap_ratio(&inner, &outer) < 1.0);
    }

    #[test]
    fn test_ratio_symmetric_only_for_equal_areas() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 15.0, 15.0);
        assert_eq!(overlap_ratio(&a, &b), overlap_ratio(&b, &a));
    }

    #[test]
    fn test_degenerate_rect_matches_nothing() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let empty = Rect::new(50.0, 50.0, 50.0, 80.0);
        assert_eq!(overlap_ratio(&a, &empty), 0.0);
    }

    #[test]
    fn test_edge_touching_is_disjoint() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 20.0, 10.0);
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn test_black_is_dark_at_any_threshold() {
        assert!(is_dark((0.0, 0.0, 0.0), 0.0));
        assert!(is_dark((0.0, 0.0, 0.0), 0.15));
        assert!(is_dark((0.0, 0.0, 0.0), 1.0));
    }

    #[test]
    fn test_white_is_never_dark_below_one() {
        assert!(!is_dark((1.0, 1.0, 1.0), 0.0));
        assert!(!is_dark((1.0, 1.0, 1.0), 0.5));
        assert!(!is_dark((1.0, 1.0, 1.0), 0.999));
    }

    #[test]
    fn test_one_bright_channel_defeats_darkness() {
        assert!(is_dark((0.1, 0.1, 0.1), 0.15));
        assert!(!is_dark((0.1, 0.1, 0.9), 0.15));
    }
}
