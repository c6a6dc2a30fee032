//! Shape extraction from raw sensor contours.
//!
//! The real vision pipeline is an external collaborator; the runtime only
//! depends on the [`ShapeExtractor`] contract. [`TriangleExtractor`] is a
//! deliberately simple built-in that finds the dominant triangular marker
//! in a contour — enough to exercise the full acquisition path headless.

use vantage_types::{Point2, Polygon};

/// Extracts candidate polygons from a raw contour.
///
/// Implementations may return any number of polygons, including none.
/// Each polygon is an ordered vertex sequence.
pub trait ShapeExtractor: Send + Sync {
    fn extract(&self, contour: &[Point2]) -> Vec<Polygon>;
}

/// An extractor that never finds anything. Useful for driving the
/// "empty detection" paths in tests.
#[derive(Debug, Default)]
pub struct NullExtractor;

impl ShapeExtractor for NullExtractor {
    fn extract(&self, _contour: &[Point2]) -> Vec<Polygon> {
        Vec::new()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// TriangleExtractor
// ────────────────────────────────────────────────────────────────────────────

/// Reduces a contour to the largest triangle inscribed in its convex
/// hull — the tracked markers are triangular, so the dominant triangle of
/// a clean contour *is* the marker.
///
/// Triangles below `min_area` are treated as noise and dropped, in which
/// case the extraction is empty.
#[derive(Debug, Clone, Copy)]
pub struct TriangleExtractor {
    min_area: f32,
}

impl TriangleExtractor {
    /// Create an extractor that drops triangles smaller than `min_area`
    /// (grid-frame square units).
    pub fn new(min_area: f32) -> Self {
        Self {
            min_area: min_area.max(0.0),
        }
    }
}

impl Default for TriangleExtractor {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl ShapeExtractor for TriangleExtractor {
    fn extract(&self, contour: &[Point2]) -> Vec<Polygon> {
        let hull = convex_hull(contour);
        if hull.len() < 3 {
            return Vec::new();
        }

        // O(h³) max-area scan; hulls of marker contours are tiny.
        let mut best: Option<[Point2; 3]> = None;
        let mut best_area = 0.0;
        for i in 0..hull.len() {
            for j in (i + 1)..hull.len() {
                for k in (j + 1)..hull.len() {
                    let area = cross(hull[i], hull[j], hull[k]).abs() * 0.5;
                    if area > best_area {
                        best_area = area;
                        best = Some([hull[i], hull[j], hull[k]]);
                    }
                }
            }
        }

        match best {
            Some(vertices) if best_area >= self.min_area && best_area > 0.0 => {
                vec![Polygon::new(vertices.to_vec())]
            }
            _ => Vec::new(),
        }
    }
}

/// Cross product of `(a - o) × (b - o)`.
fn cross(o: Point2, a: Point2, b: Point2) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Andrew's monotone-chain convex hull. Collinear points are dropped.
/// Returns fewer than 3 points for degenerate input.
fn convex_hull(points: &[Point2]) -> Vec<Point2> {
    let mut pts: Vec<Point2> = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup_by(|a, b| a.x == b.x && a.y == b.y);
    if pts.len() < 3 {
        return pts;
    }

    let mut hull: Vec<Point2> = Vec::with_capacity(pts.len() * 2);
    for &p in &pts {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn triangle_contour_extracts_itself() {
        let contour = [p(0.0, 0.0), p(6.0, 0.0), p(0.0, 3.0)];
        let shapes = TriangleExtractor::default().extract(&contour);
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].vertices.len(), 3);
        assert!((shapes[0].signed_area().abs() - 9.0).abs() < 1e-4);
    }

    #[test]
    fn square_contour_yields_half_area_triangle() {
        let contour = [p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0), p(0.0, 2.0)];
        let shapes = TriangleExtractor::default().extract(&contour);
        assert_eq!(shapes.len(), 1);
        assert!((shapes[0].signed_area().abs() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn noisy_interior_points_do_not_change_the_marker() {
        let contour = [
            p(0.0, 0.0),
            p(6.0, 0.0),
            p(0.0, 3.0),
            // Interior noise.
            p(1.0, 1.0),
            p(2.0, 0.5),
        ];
        let shapes = TriangleExtractor::default().extract(&contour);
        assert_eq!(shapes.len(), 1);
        assert!((shapes[0].signed_area().abs() - 9.0).abs() < 1e-4);
    }

    #[test]
    fn fewer_than_three_points_is_empty() {
        assert!(TriangleExtractor::default()
            .extract(&[p(1.0, 1.0), p(2.0, 2.0)])
            .is_empty());
        assert!(TriangleExtractor::default().extract(&[]).is_empty());
    }

    #[test]
    fn collinear_contour_is_empty() {
        let contour = [p(0.0, 0.0), p(1.0, 1.0), p(2.0, 2.0), p(3.0, 3.0)];
        assert!(TriangleExtractor::default().extract(&contour).is_empty());
    }

    #[test]
    fn min_area_filters_small_markers() {
        let contour = [p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0)]; // area 0.5
        assert!(TriangleExtractor::new(1.0).extract(&contour).is_empty());
        assert_eq!(TriangleExtractor::new(0.25).extract(&contour).len(), 1);
    }

    #[test]
    fn null_extractor_always_empty() {
        let contour = [p(0.0, 0.0), p(6.0, 0.0), p(0.0, 3.0)];
        assert!(NullExtractor.extract(&contour).is_empty());
    }
}
