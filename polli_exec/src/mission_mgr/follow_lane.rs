//! # [`FollowLane`] mission phase

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, warn};

use super::{
    params::MissionMgrParams,
    phases::DetectFlower,
    MissionMgrError, MissionPersistentData, Phase, StepOutput, TickInput, Transition,
};
use crate::loco_ctrl::MnvrCommand;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// FollowLane phase of the MissionMgr.
///
/// Possible transitions:
/// - DetectFlower, on sighting a pollination target
pub struct FollowLane;

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FollowLane {
    pub fn new() -> Self {
        Self
    }

    pub fn step(
        &mut self,
        params: &MissionMgrParams,
        persistent: &mut MissionPersistentData,
        input: &TickInput,
    ) -> Result<(Transition, StepOutput), MissionMgrError> {
        match input.lane_offset_px {
            Some(offset_px) => {
                persistent.lane_lost_streak = 0;

                // A pollination target in view pre-empts lane keeping
                let best = persistent
                    .target_locator
                    .locate(input.flowers, input.frame.width())
                    .cloned();

                if let Some(target) = best {
                    info!(
                        "Pollination target sighted at ({:.0}, {:.0}), area {} px",
                        target.centroid_px.x, target.centroid_px.y, target.area_px
                    );
                    persistent.last_locked_target = Some(target);

                    return Ok((
                        Transition::To(Phase::DetectFlower(DetectFlower::new())),
                        StepOutput::mnvr(MnvrCommand::forward(params.approach_speed_pct)),
                    ));
                }

                Ok((
                    Transition::Stay,
                    StepOutput::mnvr(MnvrCommand::steer(
                        offset_px as f64,
                        params.cruise_speed_pct,
                    )),
                ))
            }

            None => {
                persistent.lane_lost_streak += 1;

                if persistent.lane_lost_streak >= params.lane_lost_limit {
                    warn!(
                        "Track lost for {} cycle(s), rotating to search",
                        persistent.lane_lost_streak
                    );
                    persistent.lane_lost_streak = 0;

                    return Ok((
                        Transition::Stay,
                        StepOutput::mnvr(MnvrCommand::rotate(
                            params.rotation_speed_pct,
                            params.recovery_rotate_duration_s,
                        )),
                    ));
                }

                Ok((Transition::Stay, StepOutput::none()))
            }
        }
    }
}
