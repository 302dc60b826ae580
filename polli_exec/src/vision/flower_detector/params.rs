//! Parameters structure for FlowerDetector

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for the flower detector.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    // ---- MORPHOLOGY ----
    /// Side of the square erosion kernel.
    ///
    /// Units: pixels
    pub erode_kernel_px: usize,

    /// Number of erosion passes applied before dilation.
    pub erode_iterations: u32,

    /// Side of the square dilation kernel.
    ///
    /// Units: pixels
    pub dilate_kernel_px: usize,

    /// Number of dilation passes applied after erosion.
    pub dilate_iterations: u32,

    // ---- AREA BAND ----
    /// Minimum accepted blob area (inclusive).
    ///
    /// Units: pixels
    pub min_area_px: u32,

    /// Maximum accepted blob area (inclusive).
    ///
    /// Units: pixels
    pub max_area_px: u32,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            erode_kernel_px: 5,
            erode_iterations: 1,
            dilate_kernel_px: 5,
            dilate_iterations: 2,
            min_area_px: 500,
            max_area_px: 5000,
        }
    }
}
