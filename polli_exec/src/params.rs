//! # Rover Executable Parameters
//!
//! This module provides parameters for the rover executable itself; module
//! parameters live in their own files.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::vision::color_table::Lighting;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolliExecParams {
    /// Lighting condition the colour bands are resolved for.
    pub lighting: Lighting,

    /// Expected camera frame width.
    ///
    /// Units: pixels
    pub cam_width_px: u32,

    /// Expected camera frame height.
    ///
    /// Units: pixels
    pub cam_height_px: u32,
}
