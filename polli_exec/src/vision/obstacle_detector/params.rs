//! Parameters structure for ObstacleDetector

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for the obstacle detector.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Side of the square morphology kernel.
    ///
    /// Units: pixels
    pub morph_kernel_px: usize,

    /// Number of erosion passes.
    pub erode_iterations: u32,

    /// Number of dilation passes.
    pub dilate_iterations: u32,

    /// Minimum accepted region area.
    ///
    /// Units: pixels
    pub min_area_px: u32,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            morph_kernel_px: 5,
            erode_iterations: 1,
            dilate_iterations: 2,
            min_area_px: 1000,
        }
    }
}
