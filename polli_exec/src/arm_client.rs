//! # Pollination Effector Client
//!
//! Facade over the arm's pollinate sequence. The arm performs its own
//! approach-actuate-retract motion internally: from the mission manager's
//! point of view the call is atomic and blocking, returning only whether the
//! sequence completed.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A request to pollinate the flower at the given image position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PolliRequest {
    /// Centroid of the locked target flower.
    ///
    /// Units: pixels, image frame
    pub target_px: Point2<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum ArmClientError {
    /// The effector reported a hardware-level fault. The mission must be
    /// aborted through an emergency stop.
    #[error("The pollination effector reported a hardware fault: {0}")]
    HardFault(String),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The pollination effector interface.
pub trait PolliEffector {
    /// Execute the pollinate sequence against the given target.
    ///
    /// Blocking; `Ok(true)` when the sequence completed and the effector
    /// believes it actuated the flower, `Ok(false)` when the sequence
    /// completed without effect (the retry path), `Err` on a hardware fault.
    fn pollinate(&mut self, request: &PolliRequest) -> Result<bool, ArmClientError>;
}
