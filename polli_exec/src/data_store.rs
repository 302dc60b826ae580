//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::loco_ctrl;
use crate::mech_client::WheelDems;
use crate::vision::flower_detector::FlowerDetector;
use crate::vision::lane_follower::LaneFollower;
use crate::vision::obstacle_detector::ObstacleDetector;
use crate::vision::{FlowerCandidate, ObstacleRegion};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    // Perception modules
    pub flower_detector: FlowerDetector,
    pub lane_follower: LaneFollower,
    pub obstacle_detector: ObstacleDetector,

    // Perception outputs, fresh each cycle
    pub flowers: Vec<FlowerCandidate>,
    pub lane_offset_px: Option<i32>,
    pub obstacles: Vec<ObstacleRegion>,

    // LocoCtrl
    pub loco_ctrl: loco_ctrl::LocoCtrl,
    pub loco_ctrl_input: loco_ctrl::InputData,
    pub loco_ctrl_output: WheelDems,
    pub loco_ctrl_status_rpt: loco_ctrl::StatusReport,

    // Effector
    /// Outcome of the last commanded pollination sequence, consumed by the
    /// mission manager on the next cycle.
    pub polli_result: Option<bool>,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Number of consecutive cycles without a frame
    pub num_consec_no_frame: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and
    /// sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        self.is_1_hz_cycle = self.num_cycles % (cycle_frequency_hz as u128) == 0;

        self.flowers = Vec::new();
        self.lane_offset_px = None;
        self.obstacles = Vec::new();

        self.loco_ctrl_input = loco_ctrl::InputData::default();
        self.loco_ctrl_output = WheelDems::default();
        self.loco_ctrl_status_rpt = loco_ctrl::StatusReport::default();
    }
}
