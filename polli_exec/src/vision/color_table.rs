//! # Colour band table
//!
//! All colour thresholds used by the vision modules come from one table,
//! keyed by lighting condition and band class, loaded once at startup and
//! injected read-only into each module. Detection and verification therefore
//! always agree on what "marker coloured" means.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use util::params;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// An inclusive per-channel range in HSV space.
///
/// Channels follow the OpenCV convention used to tune the bands on the real
/// course: hue in [0, 179], saturation and value in [0, 255].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HsvBand {
    /// Lower bound, [hue, saturation, value]
    pub lower: [u8; 3],

    /// Upper bound, [hue, saturation, value]
    pub upper: [u8; 3],
}

/// The set of colour bands for one lighting condition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ColorBandSet {
    /// Female (pollination target) flower colour
    pub female: HsvBand,

    /// Male flower colour
    pub male: HsvBand,

    /// Pollination marker colour
    pub marker: HsvBand,

    /// Obstacle colour
    pub obstacle: HsvBand,
}

/// Colour band table over all supported lighting conditions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ColorTable {
    pub normal: ColorBandSet,
    pub bright: ColorBandSet,
    pub dim: ColorBandSet,
}

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Lighting conditions the bands are tuned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lighting {
    Normal,
    Bright,
    Dim,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl HsvBand {
    /// Returns true if the given HSV pixel lies inside the band (bounds
    /// inclusive).
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| self.lower[i] <= hsv[i] && hsv[i] <= self.upper[i])
    }
}

impl ColorTable {
    /// Load the colour table from the given parameter file.
    pub fn load(param_file_path: &str) -> Result<Self, params::LoadError> {
        params::load(param_file_path)
    }

    /// Get the band set for a lighting condition.
    pub fn bands(&self, lighting: Lighting) -> &ColorBandSet {
        match lighting {
            Lighting::Normal => &self.normal,
            Lighting::Bright => &self.bright,
            Lighting::Dim => &self.dim,
        }
    }
}
