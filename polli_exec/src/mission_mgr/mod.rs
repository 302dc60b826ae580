//! # MissionMgr module
//!
//! This module implements the [`MissionMgr`] state machine, which drives the
//! pollination mission. The machine is broken down into a number of phases:
//!
//! - `Start` - One-shot initialisation: stamps the mission clock and commands
//!   cruise motion.
//! - `FollowLane` - The rover follows the track marking, watching for
//!   pollination targets and recovering from lost-track streaks.
//! - `DetectFlower` - A target was sighted; re-detect and lock the best
//!   candidate.
//! - `ApproachFlower` - Centre the locked target laterally and close in until
//!   the arrival threshold.
//! - `Pollinate` - Command the effector sequence and verify the marker on the
//!   post-actuation frame.
//! - `ReturnLane` - Back away, rotate ~180 degrees and resume cruise.
//! - `Finish` - Terminal: all motion stopped.
//!
//! Perception returning "nothing found" is never an error here: every absence
//! drives an explicit transition or counter. The caller checks the
//! termination predicates (`is_mission_complete`, `is_time_up`) once per tick
//! independent of phase.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod approach_flower;
mod detect_flower;
mod follow_lane;
mod params;
mod pollinate;
mod return_lane;
pub mod tm;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub mod phases {
    pub use super::approach_flower::ApproachFlower;
    pub use super::detect_flower::DetectFlower;
    pub use super::follow_lane::FollowLane;
    pub use super::pollinate::Pollinate;
    pub use super::return_lane::ReturnLane;
}

pub use self::{params::MissionMgrParams, tm::MissionTm};

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt::Display;

use image::RgbImage;
use log::{error, info};

use crate::arm_client::PolliRequest;
use crate::loco_ctrl::MnvrCommand;
use crate::vision::color_table::ColorBandSet;
use crate::vision::polli_checker::PolliChecker;
use crate::vision::target_locator::TargetLocator;
use crate::vision::{FlowerCandidate, ObstacleRegion};
use phases::*;
use util::archive::{Archived, Archiver};
use util::session::Session;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Mission Manager
///
/// This struct is responsible for managing the state of the pollination
/// mission, including the current phase, the completion count and the locked
/// target.
pub struct MissionMgr {
    /// Parameters for the MissionMgr and all its phases.
    pub params: MissionMgrParams,

    /// Persistent data of the MissionMgr.
    ///
    /// This is data which is valid over all phases, such as the pollination
    /// count, so it is not lost when a new phase is entered.
    pub persistent: MissionPersistentData,

    /// The current phase of the mission.
    phase: Phase,

    arch_tm: Archiver,
}

/// Data which persists across phase changes.
pub struct MissionPersistentData {
    /// Number of confirmed pollinations. Monotone, never exceeds the quota.
    pub polli_count: u32,

    /// The most recently locked target flower.
    ///
    /// Non-`None` only in the DetectFlower, ApproachFlower and Pollinate
    /// phases; the dispatcher clears it on any transition elsewhere.
    pub last_locked_target: Option<FlowerCandidate>,

    /// Consecutive cycles with a no-lane reading.
    pub lane_lost_streak: u32,

    /// Failed pollination attempts against the current flower.
    pub polli_attempts: u32,

    /// Session-elapsed time at which the mission started, stamped once by
    /// the Start phase.
    pub mission_start_time_s: Option<f64>,

    /// Instance of the [`TargetLocator`] module, selecting the best
    /// candidate.
    pub target_locator: TargetLocator,

    /// Instance of the [`PolliChecker`] module, verifying actuation.
    pub polli_checker: PolliChecker,

    /// Telemetry summarising the mission state, refreshed every step.
    pub tm: MissionTm,
}

/// Input data for one mission step. All perception results are fresh for
/// this cycle.
pub struct TickInput<'a> {
    /// Session-elapsed time of this cycle.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// The frame acquired this cycle. Skipped cycles (no frame) never reach
    /// the mission manager.
    pub frame: &'a RgbImage,

    /// All flower candidates classified in the frame.
    pub flowers: &'a [FlowerCandidate],

    /// The lane reading, `None` when no track pixels were found.
    pub lane_offset_px: Option<i32>,

    /// Obstacle regions in view (informational).
    pub obstacles: &'a [ObstacleRegion],

    /// Outcome of the effector sequence requested on a previous cycle, if
    /// one has completed since.
    pub polli_result: Option<bool>,
}

/// Output of a phase's step function.
pub struct StepOutput {
    /// Manouvre command for locomotion control, if any.
    pub mnvr: Option<MnvrCommand>,

    /// Request for the pollination effector, if any. The caller executes the
    /// blocking sequence and feeds the result back on the next cycle.
    pub polli_req: Option<PolliRequest>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors that can occur in the mission manager.
#[derive(Debug, thiserror::Error)]
pub enum MissionMgrError {
    #[error("Failed to load MissionMgrParams: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Phase requires a locked target but none is set")]
    NoLockedTarget,
}

/// The mission phases.
pub enum Phase {
    Start,
    FollowLane(FollowLane),
    DetectFlower(DetectFlower),
    ApproachFlower(ApproachFlower),
    Pollinate(Pollinate),
    ReturnLane(ReturnLane),
    Finish,
}

/// The phase change requested by a phase's step function.
pub enum Transition {
    /// Remain in the current phase.
    Stay,

    /// Enter the given phase on the next cycle.
    To(Phase),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MissionMgr {
    /// Initialise the mission manager from its parameter file.
    ///
    /// The colour band set provides the marker band used by the pollination
    /// checker, resolved from the same table as detection.
    pub fn init(
        params_path: &str,
        colors: &ColorBandSet,
        session: &Session,
    ) -> Result<Self, MissionMgrError> {
        let params: MissionMgrParams =
            util::params::load(params_path).map_err(MissionMgrError::ParamLoadError)?;

        let arch_tm = Archiver::from_path(session, "mission_mgr/tm.csv").unwrap_or_default();

        let mut mgr = Self::with_params(params, colors);
        mgr.arch_tm = arch_tm;

        Ok(mgr)
    }

    /// Build a mission manager directly from parameter values.
    pub fn with_params(params: MissionMgrParams, colors: &ColorBandSet) -> Self {
        let target_locator = TargetLocator::with_params(params.target_locator.clone());
        let polli_checker = PolliChecker::with_params(params.polli_checker.clone(), colors);

        Self {
            params,
            persistent: MissionPersistentData {
                polli_count: 0,
                last_locked_target: None,
                lane_lost_streak: 0,
                polli_attempts: 0,
                mission_start_time_s: None,
                target_locator,
                polli_checker,
                tm: MissionTm::default(),
            },
            phase: Phase::Start,
            arch_tm: Archiver::default(),
        }
    }

    /// Step the mission state machine with this cycle's perception results.
    ///
    /// A phase error is absorbed here: it is logged and the machine fails
    /// safe to FollowLane with a stop command, so one broken tick never
    /// terminates the mission loop.
    pub fn step(&mut self, input: &TickInput) -> StepOutput {
        let result = match &mut self.phase {
            Phase::Start => step_start(&self.params, &mut self.persistent, input),
            Phase::FollowLane(follow) => follow.step(&self.params, &mut self.persistent, input),
            Phase::DetectFlower(detect) => detect.step(&self.params, &mut self.persistent, input),
            Phase::ApproachFlower(approach) => {
                approach.step(&self.params, &mut self.persistent, input)
            }
            Phase::Pollinate(pollinate) => {
                pollinate.step(&self.params, &mut self.persistent, input)
            }
            Phase::ReturnLane(ret) => ret.step(&self.params, &mut self.persistent, input),
            // Terminal: keep the rover stopped
            Phase::Finish => Ok((Transition::Stay, StepOutput::mnvr(MnvrCommand::stop()))),
        };

        let (transition, output) = match result {
            Ok(out) => out,
            Err(e) => {
                error!("Mission phase {} failed: {}; failing safe", self.phase, e);
                (
                    Transition::To(Phase::FollowLane(FollowLane::new())),
                    StepOutput::mnvr(MnvrCommand::stop()),
                )
            }
        };

        if let Transition::To(next) = transition {
            info!("Mission phase change: {} -> {}", self.phase, next);

            // The locked target only lives while a flower is being worked
            if !next.may_hold_target() {
                self.persistent.last_locked_target = None;
            }

            self.phase = next;
        }

        self.update_tm(input);

        output
    }

    /// True once the pollination quota has been reached.
    pub fn is_mission_complete(&self) -> bool {
        self.persistent.polli_count >= self.params.quota
    }

    /// True once the mission wall-clock budget is spent.
    ///
    /// Independent of phase; the caller must stop the rover on expiry. A
    /// mission which has not started yet cannot be timed out.
    pub fn is_time_up(&self, time_s: f64) -> bool {
        match self.persistent.mission_start_time_s {
            Some(start_s) => time_s - start_s > self.params.max_running_time_s,
            None => false,
        }
    }

    /// Name of the current phase.
    pub fn phase_name(&self) -> &'static str {
        self.phase.name()
    }

    /// Get a copy of the current telemetry.
    pub fn get_tm(&self) -> MissionTm {
        self.persistent.tm.clone()
    }

    /// Refresh the telemetry record from the current state.
    fn update_tm(&mut self, input: &TickInput) {
        let p = &self.persistent;
        let tm = MissionTm {
            time_s: input.time_s,
            phase: self.phase.name().to_string(),
            polli_count: p.polli_count,
            quota: self.params.quota,
            lane_offset_px: input.lane_offset_px,
            lane_lost_streak: p.lane_lost_streak,
            polli_attempts: p.polli_attempts,
            num_flower_candidates: input.flowers.len() as u32,
            num_obstacle_regions: input.obstacles.len() as u32,
            target_x_px: p.last_locked_target.as_ref().map(|t| t.centroid_px.x),
            target_y_px: p.last_locked_target.as_ref().map(|t| t.centroid_px.y),
            mission_complete: p.polli_count >= self.params.quota,
        };

        self.persistent.tm = tm;
    }
}

impl Archived for MissionMgr {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_tm.serialise(&self.persistent.tm)
    }
}

impl Phase {
    /// Phases in which a locked target may be held.
    fn may_hold_target(&self) -> bool {
        matches!(
            self,
            Phase::DetectFlower(_) | Phase::ApproachFlower(_) | Phase::Pollinate(_)
        )
    }

    fn name(&self) -> &'static str {
        match self {
            Phase::Start => "Start",
            Phase::FollowLane(_) => "FollowLane",
            Phase::DetectFlower(_) => "DetectFlower",
            Phase::ApproachFlower(_) => "ApproachFlower",
            Phase::Pollinate(_) => "Pollinate",
            Phase::ReturnLane(_) => "ReturnLane",
            Phase::Finish => "Finish",
        }
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Phase::{}", self.name())
    }
}

impl StepOutput {
    pub fn none() -> Self {
        Self {
            mnvr: None,
            polli_req: None,
        }
    }

    pub fn mnvr(cmd: MnvrCommand) -> Self {
        Self {
            mnvr: Some(cmd),
            polli_req: None,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Step function of the one-shot Start phase: stamp the mission clock and
/// move off at cruise speed.
fn step_start(
    params: &MissionMgrParams,
    persistent: &mut MissionPersistentData,
    input: &TickInput,
) -> Result<(Transition, StepOutput), MissionMgrError> {
    persistent.mission_start_time_s = Some(input.time_s);

    info!(
        "Mission started: quota {} flower(s), budget {:.0} s",
        params.quota, params.max_running_time_s
    );

    Ok((
        Transition::To(Phase::FollowLane(FollowLane::new())),
        StepOutput::mnvr(MnvrCommand::forward(params.cruise_speed_pct)),
    ))
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test;
