//! Pollination checker module
//!
//! Post-actuation verification: inspects a square region around the treated
//! flower for the marker colour signature. The fractional-ratio policy over a
//! fixed-radius crop is used; see DESIGN.md for the variant decision.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use image::RgbImage;
use log::debug;
use nalgebra::Point2;

// Internal
use super::color_table::{ColorBandSet, HsvBand};
use super::img_proc;
pub use params::Params;
use util::params::LoadError;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Pollination checker module state
#[derive(Default)]
pub struct PolliChecker {
    pub(crate) params: Params,

    /// Marker colour band for the running lighting condition.
    marker_band: HsvBand,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl PolliChecker {
    /// Initialise the pollination checker.
    pub fn init(&mut self, params_path: &str, colors: &ColorBandSet) -> Result<(), LoadError> {
        self.params = util::params::load(params_path)?;
        self.marker_band = colors.marker;
        Ok(())
    }

    /// Build a checker directly from parameter values.
    pub fn with_params(params: Params, colors: &ColorBandSet) -> Self {
        Self {
            params,
            marker_band: colors.marker,
        }
    }

    /// Check whether the region around the target carries the pollination
    /// marker.
    ///
    /// Crops a square of side `2 * region_radius_px` centred on the target,
    /// clamped to the frame bounds; returns true iff the fraction of
    /// marker-band pixels in the crop exceeds the configured ratio. An empty
    /// crop is a failed check, not an error.
    pub fn check(&self, frame: &RgbImage, target_px: Point2<f64>) -> bool {
        let (w, h) = frame.dimensions();
        if w == 0 || h == 0 {
            return false;
        }

        let r = self.params.region_radius_px as i64;
        let cx = target_px.x.round() as i64;
        let cy = target_px.y.round() as i64;

        let x0 = (cx - r).max(0);
        let y0 = (cy - r).max(0);
        let x1 = (cx + r).min(w as i64);
        let y1 = (cy + r).min(h as i64);

        if x0 >= x1 || y0 >= y1 {
            return false;
        }

        let mut marker_px = 0u32;
        for y in y0..y1 {
            for x in x0..x1 {
                let px = frame.get_pixel(x as u32, y as u32);
                if self.marker_band.contains(img_proc::rgb_to_hsv(px.0)) {
                    marker_px += 1;
                }
            }
        }

        let total_px = ((x1 - x0) * (y1 - y0)) as u32;
        let frac = marker_px as f64 / total_px as f64;

        debug!(
            "PolliChecker: {}/{} marker pixels ({:.3}) around ({}, {})",
            marker_px, total_px, frac, cx, cy
        );

        frac > self.params.marker_frac_threshold
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use image::Rgb;

    const MARKER: [u8; 3] = [255, 255, 255];
    const GROUND: [u8; 3] = [80, 160, 80];

    fn checker() -> PolliChecker {
        let dummy = HsvBand {
            lower: [0, 0, 0],
            upper: [0, 0, 0],
        };
        PolliChecker::with_params(
            Params {
                region_radius_px: 50,
                marker_frac_threshold: 0.1,
            },
            &ColorBandSet {
                female: dummy,
                male: dummy,
                marker: HsvBand {
                    lower: [0, 0, 200],
                    upper: [179, 30, 255],
                },
                obstacle: dummy,
            },
        )
    }

    #[test]
    fn test_marked_flower_confirms() {
        let mut frame = RgbImage::from_pixel(640, 480, Rgb(GROUND));
        // 40x40 marker blob: 1600 of 10000 crop pixels = 16%
        for y in 220..260 {
            for x in 300..340 {
                frame.put_pixel(x, y, Rgb(MARKER));
            }
        }

        assert!(checker().check(&frame, Point2::new(320.0, 240.0)));
    }

    #[test]
    fn test_unmarked_flower_fails() {
        let frame = RgbImage::from_pixel(640, 480, Rgb(GROUND));
        assert!(!checker().check(&frame, Point2::new(320.0, 240.0)));
    }

    #[test]
    fn test_crop_clamped_at_border() {
        let mut frame = RgbImage::from_pixel(640, 480, Rgb(GROUND));
        // Corner crop clamps to 50x50 = 2500 px; 900 marker px = 36%
        for y in 0..30 {
            for x in 0..30 {
                frame.put_pixel(x, y, Rgb(MARKER));
            }
        }

        assert!(checker().check(&frame, Point2::new(0.0, 0.0)));
    }

    #[test]
    fn test_degenerate_region_fails() {
        let frame = RgbImage::from_pixel(640, 480, Rgb(MARKER));

        let degenerate = PolliChecker::with_params(
            Params {
                region_radius_px: 0,
                marker_frac_threshold: 0.1,
            },
            &ColorBandSet {
                female: HsvBand {
                    lower: [0, 0, 0],
                    upper: [0, 0, 0],
                },
                male: HsvBand {
                    lower: [0, 0, 0],
                    upper: [0, 0, 0],
                },
                marker: HsvBand {
                    lower: [0, 0, 200],
                    upper: [179, 30, 255],
                },
                obstacle: HsvBand {
                    lower: [0, 0, 0],
                    upper: [0, 0, 0],
                },
            },
        );

        assert!(!degenerate.check(&frame, Point2::new(320.0, 240.0)));
    }
}
