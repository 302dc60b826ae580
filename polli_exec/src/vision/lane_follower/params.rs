//! Parameters structure for LaneFollower

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for the lane follower.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Inverse binarisation threshold: pixels with luma at or below this
    /// value are taken as track marking.
    pub bin_threshold: u8,

    /// Fraction of the frame height, measured from the bottom, considered
    /// for the track centroid.
    pub lower_region_frac: f64,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            bin_threshold: 127,
            lower_region_frac: 0.4,
        }
    }
}
