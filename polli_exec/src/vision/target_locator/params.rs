//! Parameters structure for TargetLocator

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for the target locator.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Weight applied to a candidate's horizontal distance from the frame
    /// centre when scoring. Offset is penalised this many times more than a
    /// pixel of area is rewarded.
    pub lateral_offset_weight: f64,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            lateral_offset_weight: 2.0,
        }
    }
}
