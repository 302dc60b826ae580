//! Flower detector module
//!
//! Classifies flower blobs in a frame by colour band: segmentation in HSV,
//! morphological cleanup, connected component extraction, area filtering and
//! centroid computation, with each surviving blob tagged with the category of
//! the band it was segmented in.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use image::RgbImage;
use log::trace;

// Internal
use super::color_table::{ColorBandSet, HsvBand};
use super::img_proc;
use super::{FlowerCandidate, FlowerType};
pub use params::Params;
use util::params::LoadError;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Flower detector module state
#[derive(Default)]
pub struct FlowerDetector {
    pub(crate) params: Params,

    /// Colour band for female (target) flowers, resolved from the colour
    /// table at init for the running lighting condition.
    female_band: HsvBand,

    /// Colour band for male flowers.
    male_band: HsvBand,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl FlowerDetector {
    /// Initialise the flower detector.
    ///
    /// Loads the module parameters and captures the colour bands for the
    /// running lighting condition.
    pub fn init(&mut self, params_path: &str, colors: &ColorBandSet) -> Result<(), LoadError> {
        self.params = util::params::load(params_path)?;
        self.female_band = colors.female;
        self.male_band = colors.male;

        Ok(())
    }

    /// Build a detector directly from parameter values, bypassing file
    /// loading.
    pub fn with_params(params: Params, colors: &ColorBandSet) -> Self {
        Self {
            params,
            female_band: colors.female,
            male_band: colors.male,
        }
    }

    /// Detect all flower candidates in the frame, in no particular order.
    ///
    /// An empty frame yields an empty vector, not an error.
    pub fn detect(&self, frame: &RgbImage) -> Vec<FlowerCandidate> {
        if frame.width() == 0 || frame.height() == 0 {
            return Vec::new();
        }

        let mut candidates = Vec::new();

        let bands = [
            (FlowerType::Female, &self.female_band),
            (FlowerType::Male, &self.male_band),
        ];

        for &(flower_type, band) in bands.iter() {
            let mask = img_proc::hsv_mask(frame, band);

            // Erosion before dilation: speckle is removed before gaps are
            // closed
            let mask = img_proc::erode(
                &mask,
                self.params.erode_kernel_px,
                self.params.erode_iterations,
            );
            let mask = img_proc::dilate(
                &mask,
                self.params.dilate_kernel_px,
                self.params.dilate_iterations,
            );

            for comp in img_proc::extract_components(&mask) {
                if comp.area_px < self.params.min_area_px
                    || comp.area_px > self.params.max_area_px
                {
                    continue;
                }

                candidates.push(FlowerCandidate {
                    flower_type,
                    centroid_px: comp.centroid_px,
                    area_px: comp.area_px,
                    boundary_px: comp.boundary_px,
                });
            }
        }

        trace!("FlowerDetector: {} candidate(s) in frame", candidates.len());

        candidates
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

    fn test_band_set() -> ColorBandSet {
        ColorBandSet {
            female: HsvBand {
                lower: [20, 100, 100],
                upper: [30, 255, 255],
            },
            male: HsvBand {
                lower: [0, 0, 200],
                upper: [179, 30, 255],
            },
            marker: HsvBand {
                lower: [0, 0, 200],
                upper: [179, 30, 255],
            },
            obstacle: HsvBand {
                lower: [0, 0, 0],
                upper: [179, 255, 30],
            },
        }
    }

    fn test_detector() -> FlowerDetector {
        FlowerDetector::with_params(
            Params {
                erode_kernel_px: 5,
                erode_iterations: 1,
                dilate_kernel_px: 5,
                dilate_iterations: 2,
                min_area_px: 500,
                max_area_px: 5000,
            },
            &test_band_set(),
        )
    }

    fn fill_rect(frame: &mut RgbImage, x0: u32, y0: u32, w: u32, h: u32, colour: [u8; 3]) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                frame.put_pixel(x, y, Rgb(colour));
            }
        }
    }

    /// Ground colour outside every band (mid green, saturated, hue ~60 deg)
    const GROUND: [u8; 3] = [80, 160, 80];

    /// Course yellow, inside the female band
    const YELLOW: [u8; 3] = [255, 200, 0];

    #[test]
    fn test_no_target_pixels_yields_empty() {
        let frame = RgbImage::from_pixel(640, 480, Rgb(GROUND));
        assert!(test_detector().detect(&frame).is_empty());
    }

    #[test]
    fn test_empty_frame_yields_empty() {
        let frame = RgbImage::new(0, 0);
        assert!(test_detector().detect(&frame).is_empty());
    }

    #[test]
    fn test_single_female_blob() {
        let mut frame = RgbImage::from_pixel(640, 480, Rgb(GROUND));
        // 45x45 blob centred on the frame: 2025 px raw, within [500, 5000]
        // after one 5x5 erosion and two 5x5 dilations
        fill_rect(&mut frame, 298, 218, 45, 45, YELLOW);

        let candidates = test_detector().detect(&frame);
        assert_eq!(candidates.len(), 1);

        let c = &candidates[0];
        assert_eq!(c.flower_type, FlowerType::Female);
        assert!((c.centroid_px.x - 320.0).abs() < 1.0);
        assert!((c.centroid_px.y - 240.0).abs() < 1.0);
        assert!(c.area_px >= 500 && c.area_px <= 5000);
        assert!(!c.boundary_px.is_empty());
    }

    #[test]
    fn test_area_band_filtering() {
        let mut frame = RgbImage::from_pixel(640, 480, Rgb(GROUND));
        // Too small: eroded away entirely by the 5x5 kernel
        fill_rect(&mut frame, 10, 10, 4, 4, YELLOW);
        // Too large: ~100x100 = 10000 px, over the max even before dilation
        fill_rect(&mut frame, 200, 200, 100, 100, YELLOW);

        assert!(test_detector().detect(&frame).is_empty());
    }

    #[test]
    fn test_male_blob_classified() {
        let mut frame = RgbImage::from_pixel(640, 480, Rgb(GROUND));
        fill_rect(&mut frame, 100, 100, 40, 40, [255, 255, 255]);

        let candidates = test_detector().detect(&frame);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].flower_type, FlowerType::Male);
    }
}
