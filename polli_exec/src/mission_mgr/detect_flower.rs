//! # [`DetectFlower`] mission phase

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;

use super::{
    params::MissionMgrParams,
    phases::{ApproachFlower, FollowLane},
    MissionMgrError, MissionPersistentData, Phase, StepOutput, TickInput, Transition,
};
use crate::loco_ctrl::MnvrCommand;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// DetectFlower phase of the MissionMgr.
///
/// Possible transitions:
/// - FollowLane, when no pollination target remains in view
/// - ApproachFlower, once the best candidate is locked
pub struct DetectFlower;

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DetectFlower {
    pub fn new() -> Self {
        Self
    }

    pub fn step(
        &mut self,
        params: &MissionMgrParams,
        persistent: &mut MissionPersistentData,
        input: &TickInput,
    ) -> Result<(Transition, StepOutput), MissionMgrError> {
        let best = persistent
            .target_locator
            .locate(input.flowers, input.frame.width())
            .cloned();

        match best {
            Some(target) => {
                persistent.last_locked_target = Some(target);

                Ok((
                    Transition::To(Phase::ApproachFlower(ApproachFlower::new())),
                    StepOutput::none(),
                ))
            }

            // Target lost: resume cruise on the track
            None => {
                info!("Pollination target lost, returning to lane following");

                Ok((
                    Transition::To(Phase::FollowLane(FollowLane::new())),
                    StepOutput::mnvr(MnvrCommand::forward(params.cruise_speed_pct)),
                ))
            }
        }
    }
}
