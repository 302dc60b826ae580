//! Parameters structure for MissionMgr

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::vision::{polli_checker, target_locator};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for the MissionMgr and all its phases.
#[derive(Debug, Clone, Deserialize)]
pub struct MissionMgrParams {
    // ---- MISSION ----
    /// Number of confirmed pollinations that completes the mission.
    pub quota: u32,

    /// Wall-clock budget for the whole mission.
    ///
    /// Units: seconds
    pub max_running_time_s: f64,

    // ---- SPEEDS ----
    /// Cruise speed while following the track.
    ///
    /// Units: percent of full speed
    pub cruise_speed_pct: f64,

    /// Speed while closing in on a locked target.
    ///
    /// Units: percent of full speed
    pub approach_speed_pct: f64,

    /// Speed of on-the-spot turns during the approach.
    ///
    /// Units: percent of full speed
    pub turn_speed_pct: f64,

    /// Speed of recovery and return rotations.
    ///
    /// Units: percent of full speed
    pub rotation_speed_pct: f64,

    /// Speed of the post-pollination backward move.
    ///
    /// Units: percent of full speed
    pub backup_speed_pct: f64,

    // ---- DURATIONS ----
    /// Length of the post-pollination backward move.
    ///
    /// Units: seconds
    pub backward_duration_s: f64,

    /// Length of the ~180 degree return rotation.
    ///
    /// Units: seconds
    pub return_rotate_duration_s: f64,

    /// Length of the lost-track recovery rotation.
    ///
    /// Units: seconds
    pub recovery_rotate_duration_s: f64,

    // ---- THRESHOLDS ----
    /// Number of consecutive no-lane cycles at which one recovery rotation
    /// is issued and the streak resets.
    pub lane_lost_limit: u32,

    /// Lateral deadband during the approach: within it the rover drives
    /// straight at the target.
    ///
    /// Units: pixels
    pub approach_deadband_px: f64,

    /// Vertical offset (target centroid minus frame centre) below which the
    /// rover is considered arrived at the flower.
    ///
    /// Units: pixels, negative above centre
    pub arrived_offset_y_px: f64,

    /// Maximum distance between the locked target and a fresh candidate for
    /// the lock to be refreshed from it.
    ///
    /// Units: pixels
    pub target_refresh_gate_px: f64,

    /// Consecutive approach cycles without a refreshable candidate before
    /// falling back to detection.
    pub target_lost_limit: u32,

    /// Failed pollination attempts against one flower before it is
    /// abandoned.
    pub polli_retry_limit: u32,

    // ---- SUB-MODULES ----
    /// Parameters of the owned target locator.
    pub target_locator: target_locator::Params,

    /// Parameters of the owned pollination checker.
    pub polli_checker: polli_checker::Params,
}

impl Default for MissionMgrParams {
    fn default() -> Self {
        MissionMgrParams {
            quota: 36,
            max_running_time_s: 600.0,
            cruise_speed_pct: 50.0,
            approach_speed_pct: 30.0,
            turn_speed_pct: 30.0,
            rotation_speed_pct: 20.0,
            backup_speed_pct: 40.0,
            backward_duration_s: 1.0,
            return_rotate_duration_s: 1.5,
            recovery_rotate_duration_s: 1.0,
            lane_lost_limit: 10,
            approach_deadband_px: 50.0,
            arrived_offset_y_px: -100.0,
            target_refresh_gate_px: 80.0,
            target_lost_limit: 5,
            polli_retry_limit: 3,
            target_locator: target_locator::Params::default(),
            polli_checker: polli_checker::Params::default(),
        }
    }
}
