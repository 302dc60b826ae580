//! Locomotion control module
//!
//! Converts high level manouvre commands (forward, backward, turns, timed
//! rotations, lane steering) into normalised differential wheel-rate demands
//! for the motor driver.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cmd;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use cmd::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during LocoCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum LocoCtrlError {
    #[error("Recieved an invalid manouvre command: {0:#?}")]
    InvalidMnvrCmd(MnvrCommand),
}
