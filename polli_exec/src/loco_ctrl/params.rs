//! Parameters structure for LocoCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Locomotion control.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    // ---- CAPABILITIES ----
    /// Maximum wheel rate magnitude that will be demanded.
    ///
    /// Units: normalised rate, 0 to 1
    pub max_rate_norm: f64,

    // ---- STEERING ----
    /// Deadband on the lane offset: at or below this magnitude the rover
    /// drives straight.
    ///
    /// Units: pixels
    pub steer_deadband_px: f64,

    /// Differential turn rate added per pixel of lane offset beyond the
    /// deadband.
    ///
    /// Units: normalised rate per pixel
    pub steer_gain_norm_per_px: f64,

    /// Maximum differential turn rate under steering.
    ///
    /// Units: normalised rate, 0 to 1
    pub steer_max_turn_norm: f64,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            max_rate_norm: 1.0,
            steer_deadband_px: 20.0,
            steer_gain_norm_per_px: 0.005,
            steer_max_turn_norm: 0.5,
        }
    }
}
