//! Commands passed into LocoCtrl

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command to execute a particular manouvre
#[derive(Clone, Copy, Debug)]
pub struct MnvrCommand {
    /// The type of manouvre to perform
    pub mnvr_type: MnvrType,

    /// The speed of the manouvre. Used by all moving manouvre types.
    ///
    /// Units: percent of full speed, 0 to 100
    pub speed_pct: Option<f64>,

    /// How long the manouvre shall run before the rover stops on its own.
    /// Required for Rotate, optional for Backward.
    ///
    /// Units: seconds
    pub duration_s: Option<f64>,

    /// The signed lane offset to steer against. Used by Steer only.
    ///
    /// Units: pixels, negative when the track is left of centre
    pub offset_px: Option<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible manouvres to be executed by LocoCtrl.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MnvrType {
    /// No manouvre - interpreted as continue with last manouvre.
    None,
    /// Stop - bring the rover to a full stop.
    Stop,
    /// Drive straight ahead.
    Forward,
    /// Drive straight backwards.
    Backward,
    /// Turn left on the spot.
    TurnLeft,
    /// Turn right on the spot.
    TurnRight,
    /// Rotate in place (clockwise) for a fixed duration.
    Rotate,
    /// Steer against a signed lane offset through the deadband mapping.
    Steer,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MnvrCommand {
    /// Determine if the command is valid (i.e. contains all required data).
    pub fn is_valid(&self) -> bool {
        match self.mnvr_type {
            MnvrType::None | MnvrType::Stop => true,
            MnvrType::Forward | MnvrType::Backward | MnvrType::TurnLeft | MnvrType::TurnRight => {
                self.speed_pct.is_some()
            }
            MnvrType::Rotate => self.speed_pct.is_some() && self.duration_s.is_some(),
            MnvrType::Steer => self.speed_pct.is_some() && self.offset_px.is_some(),
        }
    }

    /// A full stop.
    pub fn stop() -> Self {
        Self {
            mnvr_type: MnvrType::Stop,
            speed_pct: None,
            duration_s: None,
            offset_px: None,
        }
    }

    /// Drive straight ahead at the given speed.
    pub fn forward(speed_pct: f64) -> Self {
        Self {
            mnvr_type: MnvrType::Forward,
            speed_pct: Some(speed_pct),
            duration_s: None,
            offset_px: None,
        }
    }

    /// Drive backwards at the given speed, stopping after the duration.
    pub fn backward(speed_pct: f64, duration_s: f64) -> Self {
        Self {
            mnvr_type: MnvrType::Backward,
            speed_pct: Some(speed_pct),
            duration_s: Some(duration_s),
            offset_px: None,
        }
    }

    /// Turn left on the spot at the given speed.
    pub fn turn_left(speed_pct: f64) -> Self {
        Self {
            mnvr_type: MnvrType::TurnLeft,
            speed_pct: Some(speed_pct),
            duration_s: None,
            offset_px: None,
        }
    }

    /// Turn right on the spot at the given speed.
    pub fn turn_right(speed_pct: f64) -> Self {
        Self {
            mnvr_type: MnvrType::TurnRight,
            speed_pct: Some(speed_pct),
            duration_s: None,
            offset_px: None,
        }
    }

    /// Rotate in place at the given speed, stopping after the duration.
    pub fn rotate(speed_pct: f64, duration_s: f64) -> Self {
        Self {
            mnvr_type: MnvrType::Rotate,
            speed_pct: Some(speed_pct),
            duration_s: Some(duration_s),
            offset_px: None,
        }
    }

    /// Steer against the given signed lane offset at the given speed.
    pub fn steer(offset_px: f64, speed_pct: f64) -> Self {
        Self {
            mnvr_type: MnvrType::Steer,
            speed_pct: Some(speed_pct),
            duration_s: None,
            offset_px: Some(offset_px),
        }
    }
}
