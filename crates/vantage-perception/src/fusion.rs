//! Pose fusion across sensors.
//!
//! Each sensor worker publishes the latest marker polygon it has seen;
//! [`PoseFusion`] folds the current set of detections into one
//! [`GlobalPose`] on the shared camera grid.
//!
//! The merge strategy here is a naive stand-in — position is the mean of
//! the detection centroids, heading comes from the first detection's apex
//! — because the production merge algorithm is supplied externally. The
//! contract (N optional detections in, one optional pose out) is what the
//! coordination layer depends on, and it is stable regardless of the
//! strategy behind it.

use vantage_types::{GlobalPose, Point2, Polygon};

/// Merges per-sensor detections into a single [`GlobalPose`].
#[derive(Debug, Default)]
pub struct PoseFusion;

impl PoseFusion {
    pub fn new() -> Self {
        Self
    }

    /// Merge the current detection of every sensor slot.
    ///
    /// Slots holding `None` (nothing detected yet) are skipped. Returns
    /// `None` when no slot has a usable detection.
    pub fn merge(&self, detections: &[Option<Polygon>]) -> Option<GlobalPose> {
        let present: Vec<&Polygon> = detections.iter().flatten().collect();

        let centroids: Vec<Point2> = present
            .iter()
            .filter_map(|poly| poly.centroid())
            .collect();
        if centroids.is_empty() {
            return None;
        }

        let n = centroids.len() as f32;
        let (sx, sy) = centroids
            .iter()
            .fold((0.0, 0.0), |(sx, sy), c| (sx + c.x, sy + c.y));
        let position = Point2::new(sx / n, sy / n);

        let heading_rad = present
            .iter()
            .find_map(|poly| heading_of(poly))
            .unwrap_or(0.0);

        Some(GlobalPose {
            x: position.x,
            y: position.y,
            heading_rad,
        })
    }
}

/// Heading of a marker polygon: the direction from its centroid to its
/// apex (the vertex farthest from the centroid). The markers are
/// isosceles triangles pointing travel-forward, so the apex is the nose.
fn heading_of(poly: &Polygon) -> Option<f32> {
    let c = poly.centroid()?;
    let apex = poly
        .vertices
        .iter()
        .max_by(|a, b| a.distance(c).total_cmp(&b.distance(c)))?;
    if apex.distance(c) == 0.0 {
        return None;
    }
    Some((apex.y - c.y).atan2(apex.x - c.x))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(offset_x: f32, offset_y: f32) -> Polygon {
        Polygon::new(vec![
            Point2::new(offset_x, offset_y),
            Point2::new(offset_x + 6.0, offset_y),
            Point2::new(offset_x, offset_y + 3.0),
        ])
    }

    #[test]
    fn no_detections_yields_no_pose() {
        let fusion = PoseFusion::new();
        assert!(fusion.merge(&[]).is_none());
        assert!(fusion.merge(&[None, None]).is_none());
    }

    #[test]
    fn single_detection_pose_is_its_centroid() {
        let fusion = PoseFusion::new();
        let pose = fusion.merge(&[Some(triangle(0.0, 0.0)), None]).unwrap();
        assert!((pose.x - 2.0).abs() < 1e-5);
        assert!((pose.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn two_detections_average_their_centroids() {
        let fusion = PoseFusion::new();
        // Centroids (2, 1) and (4, 3).
        let pose = fusion
            .merge(&[Some(triangle(0.0, 0.0)), Some(triangle(2.0, 2.0))])
            .unwrap();
        assert!((pose.x - 3.0).abs() < 1e-5);
        assert!((pose.y - 2.0).abs() < 1e-5);
    }

    #[test]
    fn heading_points_from_centroid_to_apex() {
        let fusion = PoseFusion::new();
        // Centroid (2, 1); farthest vertex is (6, 0).
        let pose = fusion.merge(&[Some(triangle(0.0, 0.0))]).unwrap();
        let expected = (-1.0f32).atan2(4.0);
        assert!((pose.heading_rad - expected).abs() < 1e-5);
    }

    #[test]
    fn empty_polygon_slot_is_skipped() {
        let fusion = PoseFusion::new();
        let pose = fusion
            .merge(&[Some(Polygon::new(vec![])), Some(triangle(0.0, 0.0))])
            .unwrap();
        assert!((pose.x - 2.0).abs() < 1e-5);
    }
}
