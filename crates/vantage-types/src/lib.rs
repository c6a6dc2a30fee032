use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A point on the tracking plane, in the shared grid frame (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: Point2) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// An ordered vertex sequence extracted from one sensor's current frame.
///
/// One `Polygon` is the unit of detection: the most recent shape a sensor
/// worker has published for its camera. Vertex order is whatever the
/// extractor produced; consumers must not assume a winding direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<Point2>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point2>) -> Self {
        Self { vertices }
    }

    /// Arithmetic mean of the vertices, or `None` for an empty polygon.
    pub fn centroid(&self) -> Option<Point2> {
        if self.vertices.is_empty() {
            return None;
        }
        let n = self.vertices.len() as f32;
        let (sx, sy) = self
            .vertices
            .iter()
            .fold((0.0, 0.0), |(sx, sy), v| (sx + v.x, sy + v.y));
        Some(Point2::new(sx / n, sy / n))
    }

    /// Shoelace signed area. Positive for counter-clockwise winding,
    /// zero for degenerate (collinear or < 3 vertex) polygons.
    pub fn signed_area(&self) -> f32 {
        if self.vertices.len() < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for (i, a) in self.vertices.iter().enumerate() {
            let b = &self.vertices[(i + 1) % self.vertices.len()];
            sum += a.x * b.y - b.x * a.y;
        }
        sum * 0.5
    }
}

/// Fused global pose of the tracked vehicle on the camera grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalPose {
    /// X position in the grid frame.
    pub x: f32,
    /// Y position in the grid frame.
    pub y: f32,
    /// Heading angle, counter-clockwise from +X (radians).
    pub heading_rad: f32,
}

/// A fusion product: the merged pose plus provenance for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseEstimate {
    pub pose: GlobalPose,
    /// When the merge ran. Detection slots are last-write-wins with no
    /// versioning, so this is the only staleness signal consumers get.
    pub fused_at: DateTime<Utc>,
    /// Number of detection slots that contributed to the merge.
    pub sources: usize,
}

/// Global error type spanning sensor connections, hardware faults, and
/// orchestration failures.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum VantageError {
    /// Opening a sensor link failed. Fatal to that worker's construction
    /// only; the rest of the fleet keeps running.
    #[error("connection to sensor '{sensor}' failed: {details}")]
    Connection { sensor: String, details: String },

    /// A link fault during calibration or a register poll.
    #[error("hardware fault on {component}: {details}")]
    Hardware { component: String, details: String },

    /// The readiness wait was aborted (a worker died before calibrating,
    /// or a test-configured timeout elapsed).
    #[error("readiness wait aborted: {0}")]
    Readiness(String),

    /// Operator input could not be read.
    #[error("console input error: {0}")]
    Console(String),

    /// Sensor configuration discovery or parsing failed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A concurrent unit panicked or was cancelled before joining.
    #[error("task join failure: {0}")]
    Join(String),
}
