//! # Vision modules
//!
//! Every perception module consumes the freshest camera frame once per cycle
//! and produces plain values: flower candidates, a signed lane offset,
//! obstacle regions, a selected target, or a pollination verdict. "Nothing
//! found" is always a normal empty/`None` result, never an error.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod color_table;
pub mod flower_detector;
pub mod img_proc;
pub mod lane_follower;
pub mod obstacle_detector;
pub mod polli_checker;
pub mod target_locator;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// The closed set of flower categories the classifier can assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowerType {
    /// Pollination target
    Female,

    /// Pollen source, not a target
    Male,
}

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// A classified flower blob, produced fresh every cycle and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowerCandidate {
    /// Category assigned from the colour band the blob was segmented in
    pub flower_type: FlowerType,

    /// First-moment centroid of the blob
    ///
    /// Units: pixels, image frame (x right, y down)
    pub centroid_px: Point2<f64>,

    /// Blob area as a pixel count
    pub area_px: u32,

    /// Ordered outer boundary of the blob
    pub boundary_px: Vec<Point2<u32>>,
}

/// A detected obstacle region. Informational only: no controller branch is
/// driven by it, but its presence is reported in telemetry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ObstacleRegion {
    /// Top-left corner of the bounding box
    ///
    /// Units: pixels
    pub min_px: Point2<u32>,

    /// Bottom-right corner of the bounding box
    ///
    /// Units: pixels
    pub max_px: Point2<u32>,

    /// Region area as a pixel count
    pub area_px: u32,
}
