//! # [`Pollinate`] mission phase

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, warn};

use super::{
    params::MissionMgrParams,
    phases::{DetectFlower, ReturnLane},
    MissionMgrError, MissionPersistentData, Phase, StepOutput, TickInput, Transition,
};
use crate::arm_client::PolliRequest;
use crate::loco_ctrl::MnvrCommand;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Pollinate phase of the MissionMgr.
///
/// A two-beat sequence: the first cycle requests the blocking effector
/// sequence from the caller, a later cycle consumes its result and verifies
/// the marker against the post-actuation frame.
///
/// Possible transitions:
/// - Finish, on confirmed success reaching the quota
/// - ReturnLane, on confirmed success under the quota, or on abandoning the
///   flower at the retry limit
/// - DetectFlower, on a failed attempt under the retry limit
pub struct Pollinate {
    /// Whether the effector request has been emitted.
    commanded: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Pollinate {
    pub fn new() -> Self {
        Self { commanded: false }
    }

    pub fn step(
        &mut self,
        params: &MissionMgrParams,
        persistent: &mut MissionPersistentData,
        input: &TickInput,
    ) -> Result<(Transition, StepOutput), MissionMgrError> {
        let target = persistent
            .last_locked_target
            .clone()
            .ok_or(MissionMgrError::NoLockedTarget)?;

        if !self.commanded {
            self.commanded = true;

            info!(
                "Commanding pollination sequence at ({:.0}, {:.0})",
                target.centroid_px.x, target.centroid_px.y
            );

            return Ok((
                Transition::Stay,
                StepOutput {
                    mnvr: None,
                    polli_req: Some(PolliRequest {
                        target_px: target.centroid_px,
                    }),
                },
            ));
        }

        let effector_ok = match input.polli_result {
            Some(ok) => ok,
            // Sequence result not yet available
            None => return Ok((Transition::Stay, StepOutput::none())),
        };

        // The effector believing it actuated is not enough: the marker must
        // be visible around the flower on the post-actuation frame
        let confirmed =
            effector_ok && persistent.polli_checker.check(input.frame, target.centroid_px);

        if confirmed {
            persistent.polli_count += 1;
            persistent.polli_attempts = 0;

            info!(
                "Pollination confirmed ({}/{})",
                persistent.polli_count, params.quota
            );

            if persistent.polli_count >= params.quota {
                return Ok((
                    Transition::To(Phase::Finish),
                    StepOutput::mnvr(MnvrCommand::stop()),
                ));
            }

            return Ok((
                Transition::To(Phase::ReturnLane(ReturnLane::new())),
                StepOutput::mnvr(MnvrCommand::backward(
                    params.backup_speed_pct,
                    params.backward_duration_s,
                )),
            ));
        }

        persistent.polli_attempts += 1;

        if persistent.polli_attempts >= params.polli_retry_limit {
            warn!(
                "Pollination failed {} time(s), abandoning this flower",
                persistent.polli_attempts
            );
            persistent.polli_attempts = 0;

            return Ok((
                Transition::To(Phase::ReturnLane(ReturnLane::new())),
                StepOutput::mnvr(MnvrCommand::backward(
                    params.backup_speed_pct,
                    params.backward_duration_s,
                )),
            ));
        }

        info!(
            "Pollination attempt {} failed, re-detecting target",
            persistent.polli_attempts
        );

        Ok((
            Transition::To(Phase::DetectFlower(DetectFlower::new())),
            StepOutput::none(),
        ))
    }
}
