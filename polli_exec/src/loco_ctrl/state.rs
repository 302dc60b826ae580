//! Implementations for the LocoCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{MnvrCommand, MnvrType, Params};
use crate::mech_client::WheelDems;
use util::{
    archive::{Archived, Archiver},
    maths::{clamp, lin_map},
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Locomotion control module state
#[derive(Default)]
pub struct LocoCtrl {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,

    /// The manouvre currently being executed. Persists across cycles until
    /// replaced, stopped, or expired.
    pub(crate) current_cmd: Option<MnvrCommand>,

    /// Deadline of the current timed manouvre, if it carries a duration.
    pub(crate) timed_mnvr_end_s: Option<f64>,

    pub(crate) output: Option<WheelDems>,
    arch_output: Archiver,
}

/// Input data to Locomotion Control.
#[derive(Default)]
pub struct InputData {
    /// The manouvre command to be executed, or `None` if there is no new
    /// command on this cycle.
    pub cmd: Option<MnvrCommand>,

    /// Session-elapsed time of this cycle.
    ///
    /// Units: seconds
    pub time_s: f64,
}

/// Status report for LocoCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Raised when a wheel rate demand was clipped to the rate limit.
    pub left_rate_limited: bool,
    pub right_rate_limited: bool,

    /// Raised while a timed manouvre is running against its deadline.
    pub timed_mnvr_active: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for LocoCtrl {
    type InitData = &'static str;
    type InitError = params::LoadError;

    type InputData = InputData;
    type OutputData = WheelDems;
    type StatusReport = StatusReport;
    type ProcError = super::LocoCtrlError;

    /// Initialise the LocoCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        self.params = params::load(init_data)?;

        // Archiver failures are non-fatal: the module runs without archives
        self.arch_output = Archiver::from_path(session, "loco_ctrl/output.csv").unwrap_or_default();

        Ok(())
    }

    /// Perform cyclic processing of Locomotion Control.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport::default();

        // Check to see if there's a new command
        if let Some(cmd) = input_data.cmd {
            if !cmd.is_valid() {
                return Err(super::LocoCtrlError::InvalidMnvrCmd(cmd));
            }

            self.current_cmd = Some(cmd);
            self.timed_mnvr_end_s = cmd.duration_s.map(|d| input_data.time_s + d);
        }

        // A timed manouvre past its deadline becomes a stop
        if let Some(end_s) = self.timed_mnvr_end_s {
            if input_data.time_s >= end_s {
                self.current_cmd = Some(MnvrCommand::stop());
                self.timed_mnvr_end_s = None;
            } else {
                self.report.timed_mnvr_active = true;
            }
        }

        let output = match self.current_cmd {
            Some(cmd) => self.calc_dems(&cmd)?,
            // No command yet received: demand nothing
            None => WheelDems::default(),
        };

        let output = self.enforce_limits(output);

        trace!(
            "LocoCtrl output: left {:+.3}, right {:+.3}",
            output.left_rate,
            output.right_rate
        );

        // Update the output in self
        self.output = Some(output);

        Ok((output, self.report))
    }
}

impl Archived for LocoCtrl {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_output.serialise(self.output.unwrap_or_default())
    }
}

impl LocoCtrl {
    /// Calculate the wheel demands for the given manouvre command.
    fn calc_dems(&self, cmd: &MnvrCommand) -> Result<WheelDems, super::LocoCtrlError> {
        // Moving manouvres have been validated to carry a speed
        let speed_norm = cmd
            .speed_pct
            .map(|pct| lin_map((0.0, 100.0), (0.0, 1.0), pct))
            .unwrap_or(0.0);

        let dems = match cmd.mnvr_type {
            // Continue with the previous demands
            MnvrType::None => self.output.unwrap_or_default(),

            MnvrType::Stop => WheelDems::default(),

            MnvrType::Forward => WheelDems {
                left_rate: speed_norm,
                right_rate: speed_norm,
            },

            MnvrType::Backward => WheelDems {
                left_rate: -speed_norm,
                right_rate: -speed_norm,
            },

            MnvrType::TurnLeft => WheelDems {
                left_rate: -speed_norm,
                right_rate: speed_norm,
            },

            MnvrType::TurnRight => WheelDems {
                left_rate: speed_norm,
                right_rate: -speed_norm,
            },

            // Clockwise in-place rotation
            MnvrType::Rotate => WheelDems {
                left_rate: speed_norm,
                right_rate: -speed_norm,
            },

            MnvrType::Steer => self.calc_steer(cmd.offset_px.unwrap_or(0.0), speed_norm),
        };

        Ok(dems)
    }

    /// Deadband steering: small offsets drive straight, larger ones blend a
    /// differential turn toward the track, scaled by offset magnitude.
    fn calc_steer(&self, offset_px: f64, speed_norm: f64) -> WheelDems {
        if offset_px.abs() <= self.params.steer_deadband_px {
            return WheelDems {
                left_rate: speed_norm,
                right_rate: speed_norm,
            };
        }

        let turn = clamp(
            &(offset_px.abs() * self.params.steer_gain_norm_per_px),
            &0.0,
            &self.params.steer_max_turn_norm,
        );

        if offset_px < 0.0 {
            // Track left of centre: slow the left side to turn left
            WheelDems {
                left_rate: speed_norm - turn,
                right_rate: speed_norm + turn,
            }
        } else {
            WheelDems {
                left_rate: speed_norm + turn,
                right_rate: speed_norm - turn,
            }
        }
    }

    /// Clip the demands to the configured rate limit, flagging any clip in
    /// the status report.
    fn enforce_limits(&mut self, dems: WheelDems) -> WheelDems {
        let max = self.params.max_rate_norm;

        let left = clamp(&dems.left_rate, &-max, &max);
        let right = clamp(&dems.right_rate, &-max, &max);

        self.report.left_rate_limited = left != dems.left_rate;
        self.report.right_rate_limited = right != dems.right_rate;

        WheelDems {
            left_rate: left,
            right_rate: right,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
