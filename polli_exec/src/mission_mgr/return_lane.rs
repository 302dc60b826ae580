//! # [`ReturnLane`] mission phase

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;

use super::{
    params::MissionMgrParams,
    phases::FollowLane,
    MissionMgrError, MissionPersistentData, Phase, StepOutput, TickInput, Transition,
};
use crate::loco_ctrl::MnvrCommand;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// ReturnLane phase of the MissionMgr.
///
/// Entered with a timed backward manouvre already commanded; waits it out,
/// issues one timed ~180 degree rotation, waits that out, then resumes
/// cruise.
///
/// Possible transitions:
/// - FollowLane, once the rotation has completed
pub struct ReturnLane {
    /// Time at which the phase was entered.
    entered_s: Option<f64>,

    /// Time at which the rotation was commanded.
    rotate_started_s: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ReturnLane {
    pub fn new() -> Self {
        Self {
            entered_s: None,
            rotate_started_s: None,
        }
    }

    pub fn step(
        &mut self,
        params: &MissionMgrParams,
        _persistent: &mut MissionPersistentData,
        input: &TickInput,
    ) -> Result<(Transition, StepOutput), MissionMgrError> {
        let entered_s = *self.entered_s.get_or_insert(input.time_s);

        match self.rotate_started_s {
            // Backward move still running
            None => {
                if input.time_s - entered_s >= params.backward_duration_s {
                    self.rotate_started_s = Some(input.time_s);

                    info!("Rotating back towards the track");

                    return Ok((
                        Transition::Stay,
                        StepOutput::mnvr(MnvrCommand::rotate(
                            params.rotation_speed_pct,
                            params.return_rotate_duration_s,
                        )),
                    ));
                }

                Ok((Transition::Stay, StepOutput::none()))
            }

            Some(start_s) => {
                if input.time_s - start_s >= params.return_rotate_duration_s {
                    return Ok((
                        Transition::To(Phase::FollowLane(FollowLane::new())),
                        StepOutput::mnvr(MnvrCommand::forward(params.cruise_speed_pct)),
                    ));
                }

                Ok((Transition::Stay, StepOutput::none()))
            }
        }
    }
}
