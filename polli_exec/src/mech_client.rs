//! # Mechanisms Client
//!
//! This module provides the facade through which wheel demands reach the
//! motor driver. The driver itself is an external collaborator: this crate
//! specifies the interface boundary and ships a simulated implementation.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{trace, warn};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demands sent to the motor driver: normalised differential wheel rates.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct WheelDems {
    /// Left wheel rate demand, normalised between -1 and +1.
    pub left_rate: f64,

    /// Right wheel rate demand, normalised between -1 and +1.
    pub right_rate: f64,
}

/// Simulated motor driver: accepts every demand and logs it.
#[derive(Default)]
pub struct SimMechClient {
    last_dems: Option<WheelDems>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Response from the motor driver to a set of demands.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub enum MechDemsResponse {
    /// Demands were valid and will be executed
    DemsOk,

    /// Demands were invalid and have been rejected
    DemsInvalid,
}

#[derive(thiserror::Error, Debug)]
pub enum MechClientError {
    /// The driver reported a hardware-level fault. The mission must be
    /// aborted through an emergency stop.
    #[error("The motor driver reported a hardware fault: {0}")]
    HardFault(String),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The motor driver interface.
pub trait MechDriver {
    /// Send wheel demands to the driver.
    ///
    /// A `HardFault` error indicates a hardware failure; the caller must
    /// respond with an emergency stop and abort the mission.
    fn send_demands(&mut self, dems: &WheelDems) -> Result<MechDemsResponse, MechClientError>;

    /// Cut power to all motors immediately.
    fn emergency_stop(&mut self);
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for WheelDems {
    fn default() -> Self {
        WheelDems {
            left_rate: 0.0,
            right_rate: 0.0,
        }
    }
}

impl SimMechClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent demands accepted by the simulated driver.
    pub fn last_dems(&self) -> Option<WheelDems> {
        self.last_dems
    }
}

impl MechDriver for SimMechClient {
    fn send_demands(&mut self, dems: &WheelDems) -> Result<MechDemsResponse, MechClientError> {
        trace!(
            "SimMech demands: left {:+.3}, right {:+.3}",
            dems.left_rate,
            dems.right_rate
        );
        self.last_dems = Some(*dems);
        Ok(MechDemsResponse::DemsOk)
    }

    fn emergency_stop(&mut self) {
        warn!("SimMech emergency stop");
        self.last_dems = Some(WheelDems::default());
    }
}
