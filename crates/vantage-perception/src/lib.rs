//! `vantage-perception` – Shape extraction and pose fusion.
//!
//! Turns raw contour points from the sensor links into the geometric
//! detections the runtime shares, and merges the per-sensor detections
//! into one global pose estimate.
//!
//! # Modules
//!
//! - [`extract`] – [`ShapeExtractor`][extract::ShapeExtractor]: the
//!   contract the vision pipeline fulfils, plus
//!   [`TriangleExtractor`][extract::TriangleExtractor], a naive built-in
//!   that reduces a contour to its dominant marker triangle.
//! - [`fusion`] – [`PoseFusion`][fusion::PoseFusion]: merges the current
//!   detection of every sensor into a single
//!   [`GlobalPose`][vantage_types::GlobalPose].

pub mod extract;
pub mod fusion;

pub use extract::{NullExtractor, ShapeExtractor, TriangleExtractor};
pub use fusion::PoseFusion;
