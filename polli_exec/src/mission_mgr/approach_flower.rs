//! # [`ApproachFlower`] mission phase

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, warn};
use ordered_float::OrderedFloat;

use super::{
    params::MissionMgrParams,
    phases::{DetectFlower, Pollinate},
    MissionMgrError, MissionPersistentData, Phase, StepOutput, TickInput, Transition,
};
use crate::loco_ctrl::MnvrCommand;
use crate::vision::{FlowerCandidate, FlowerType};
use util::maths::norm;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// ApproachFlower phase of the MissionMgr.
///
/// Possible transitions:
/// - Pollinate, when the arrival threshold is crossed
/// - DetectFlower, when the target cannot be re-acquired
pub struct ApproachFlower {
    /// Consecutive cycles without a refreshable candidate near the lock.
    target_lost_streak: u32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ApproachFlower {
    pub fn new() -> Self {
        Self {
            target_lost_streak: 0,
        }
    }

    pub fn step(
        &mut self,
        params: &MissionMgrParams,
        persistent: &mut MissionPersistentData,
        input: &TickInput,
    ) -> Result<(Transition, StepOutput), MissionMgrError> {
        let lock = persistent
            .last_locked_target
            .clone()
            .ok_or(MissionMgrError::NoLockedTarget)?;

        // Refresh the lock from the nearest fresh candidate; steering against
        // a stale position can never observe arrival
        match nearest_female(input.flowers, &lock, params.target_refresh_gate_px) {
            Some(fresh) => {
                persistent.last_locked_target = Some(fresh.clone());
                self.target_lost_streak = 0;
            }
            None => {
                self.target_lost_streak += 1;

                if self.target_lost_streak > params.target_lost_limit {
                    warn!(
                        "Target not re-acquired for {} cycle(s), re-detecting",
                        self.target_lost_streak
                    );
                    return Ok((
                        Transition::To(Phase::DetectFlower(DetectFlower::new())),
                        StepOutput::none(),
                    ));
                }
            }
        }

        let target = persistent
            .last_locked_target
            .as_ref()
            .ok_or(MissionMgrError::NoLockedTarget)?;

        let offset_x = target.centroid_px.x - input.frame.width() as f64 / 2.0;
        let offset_y = target.centroid_px.y - input.frame.height() as f64 / 2.0;

        // Arrival takes precedence over lateral correction
        if offset_y < params.arrived_offset_y_px {
            info!("Arrived at pollination position");

            return Ok((
                Transition::To(Phase::Pollinate(Pollinate::new())),
                StepOutput::mnvr(MnvrCommand::stop()),
            ));
        }

        let mnvr = if offset_x.abs() > params.approach_deadband_px {
            if offset_x < 0.0 {
                MnvrCommand::turn_left(params.turn_speed_pct)
            } else {
                MnvrCommand::turn_right(params.turn_speed_pct)
            }
        } else {
            MnvrCommand::forward(params.approach_speed_pct)
        };

        Ok((Transition::Stay, StepOutput::mnvr(mnvr)))
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// The Female candidate nearest to the lock, within the gate radius.
fn nearest_female<'a>(
    flowers: &'a [FlowerCandidate],
    lock: &FlowerCandidate,
    gate_px: f64,
) -> Option<&'a FlowerCandidate> {
    flowers
        .iter()
        .filter(|c| c.flower_type == FlowerType::Female)
        .filter_map(|c| {
            let dist = norm(
                &[c.centroid_px.x, c.centroid_px.y],
                &[lock.centroid_px.x, lock.centroid_px.y],
            )?;
            if dist <= gate_px {
                Some((c, OrderedFloat(dist)))
            } else {
                None
            }
        })
        .min_by_key(|&(_, dist)| dist)
        .map(|(c, _)| c)
}
