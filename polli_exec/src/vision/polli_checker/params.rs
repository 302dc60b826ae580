//! Parameters structure for PolliChecker

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for the pollination checker.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Half-side of the square verification region around the target.
    ///
    /// Units: pixels
    pub region_radius_px: u32,

    /// Fraction of marker-band pixels in the crop above which pollination is
    /// considered verified.
    pub marker_frac_threshold: f64,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            region_radius_px: 50,
            marker_frac_threshold: 0.1,
        }
    }
}
