//! Mission telemetry

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Flat per-cycle summary of the mission state, archived as CSV and included
/// in the end-of-mission report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MissionTm {
    /// Session-elapsed time of the cycle this record describes.
    pub time_s: f64,

    /// Name of the current phase.
    pub phase: String,

    /// Confirmed pollinations so far.
    pub polli_count: u32,

    /// The configured quota.
    pub quota: u32,

    /// Lane reading of this cycle, empty when no track was found.
    pub lane_offset_px: Option<i32>,

    /// Consecutive no-lane cycles.
    pub lane_lost_streak: u32,

    /// Failed pollination attempts against the current flower.
    pub polli_attempts: u32,

    /// Flower candidates classified this cycle.
    pub num_flower_candidates: u32,

    /// Obstacle regions in view this cycle.
    pub num_obstacle_regions: u32,

    /// Centroid of the locked target, if one is held.
    pub target_x_px: Option<f64>,
    pub target_y_px: Option<f64>,

    /// True once the quota has been reached.
    pub mission_complete: bool,
}
