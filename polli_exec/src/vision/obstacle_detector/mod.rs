//! Obstacle detector module
//!
//! Segments the obstacle colour band and returns bounding regions. The feed
//! is informational: the mission manager sees presence/absence but no
//! controller branch is driven by it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use image::RgbImage;

// Internal
use super::color_table::{ColorBandSet, HsvBand};
use super::img_proc;
use super::ObstacleRegion;
pub use params::Params;
use util::params::LoadError;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Obstacle detector module state
#[derive(Default)]
pub struct ObstacleDetector {
    pub(crate) params: Params,

    /// Obstacle colour band for the running lighting condition.
    obstacle_band: HsvBand,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl ObstacleDetector {
    /// Initialise the obstacle detector.
    pub fn init(&mut self, params_path: &str, colors: &ColorBandSet) -> Result<(), LoadError> {
        self.params = util::params::load(params_path)?;
        self.obstacle_band = colors.obstacle;
        Ok(())
    }

    /// Build a detector directly from parameter values.
    pub fn with_params(params: Params, colors: &ColorBandSet) -> Self {
        Self {
            params,
            obstacle_band: colors.obstacle,
        }
    }

    /// Detect obstacle regions in the frame.
    pub fn detect(&self, frame: &RgbImage) -> Vec<ObstacleRegion> {
        if frame.width() == 0 || frame.height() == 0 {
            return Vec::new();
        }

        let mask = img_proc::hsv_mask(frame, &self.obstacle_band);
        let mask = img_proc::erode(&mask, self.params.morph_kernel_px, self.params.erode_iterations);
        let mask = img_proc::dilate(
            &mask,
            self.params.morph_kernel_px,
            self.params.dilate_iterations,
        );

        img_proc::extract_components(&mask)
            .into_iter()
            .filter(|c| c.area_px >= self.params.min_area_px)
            .map(|c| ObstacleRegion {
                min_px: c.min_px,
                max_px: c.max_px,
                area_px: c.area_px,
            })
            .collect()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::vision::color_table::ColorBandSet;
    use image::Rgb;

    fn band_set() -> ColorBandSet {
        let dummy = HsvBand {
            lower: [0, 0, 0],
            upper: [0, 0, 0],
        };
        ColorBandSet {
            female: dummy,
            male: dummy,
            marker: dummy,
            obstacle: HsvBand {
                lower: [0, 0, 0],
                upper: [179, 255, 30],
            },
        }
    }

    fn detector() -> ObstacleDetector {
        ObstacleDetector::with_params(
            Params {
                morph_kernel_px: 5,
                erode_iterations: 1,
                dilate_iterations: 2,
                min_area_px: 1000,
            },
            &band_set(),
        )
    }

    #[test]
    fn test_clear_course() {
        let frame = RgbImage::from_pixel(320, 240, Rgb([200, 200, 200]));
        assert!(detector().detect(&frame).is_empty());
    }

    #[test]
    fn test_obstacle_bounding_region() {
        let mut frame = RgbImage::from_pixel(320, 240, Rgb([200, 200, 200]));
        for y in 100..150 {
            for x in 100..150 {
                frame.put_pixel(x, y, Rgb([5, 5, 5]));
            }
        }

        let regions = detector().detect(&frame);
        assert_eq!(regions.len(), 1);
        let r = &regions[0];
        assert!(r.area_px >= 1000);
        assert!(r.min_px.x <= 100 && r.max_px.x >= 149);
        assert!(r.min_px.y <= 100 && r.max_px.y >= 149);
    }

    #[test]
    fn test_small_region_ignored() {
        let mut frame = RgbImage::from_pixel(320, 240, Rgb([200, 200, 200]));
        for y in 10..25 {
            for x in 10..25 {
                frame.put_pixel(x, y, Rgb([5, 5, 5]));
            }
        }

        // 15x15 survives morphology but stays well under the area floor
        assert!(detector().detect(&frame).is_empty());
    }
}
