//! Host platform utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with the host environment.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("The software root environment variable (POLLI_SW_ROOT) is not set")]
    SwRootNotSet,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the root directory of the software installation.
///
/// All relative paths used by the software (parameter files, session
/// directories) are resolved against this root.
pub fn get_polli_sw_root() -> Result<PathBuf, HostError> {
    match std::env::var("POLLI_SW_ROOT") {
        Ok(root) => Ok(PathBuf::from(root)),
        Err(_) => Err(HostError::SwRootNotSet),
    }
}
