//! Lane follower module
//!
//! Estimates the signed horizontal offset between the track marking and the
//! frame centre. The track is assumed near-field, so only the lower region of
//! the frame is considered.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use image::RgbImage;
use ndarray::s;

// Internal
use super::img_proc;
pub use params::Params;
use util::params::LoadError;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Lane follower module state
#[derive(Default)]
pub struct LaneFollower {
    pub(crate) params: Params,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl LaneFollower {
    /// Initialise the lane follower from its parameter file.
    pub fn init(&mut self, params_path: &str) -> Result<(), LoadError> {
        self.params = util::params::load(params_path)?;
        Ok(())
    }

    /// Build a follower directly from parameter values.
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    /// Estimate the lane offset for this frame.
    ///
    /// Returns the signed pixel distance between the track centroid and the
    /// frame's horizontal centre (negative left, positive right), or `None`
    /// when no track pixels are found. The absence of a track is a normal
    /// reading, not an error.
    pub fn estimate(&self, frame: &RgbImage) -> Option<i32> {
        let (w, h) = frame.dimensions();
        if w == 0 || h == 0 {
            return None;
        }

        // Inverse binary threshold: the dark marking paints true
        let mask = img_proc::luma_mask_inv(frame, self.params.bin_threshold);

        // Restrict to the near-field region at the bottom of the frame
        let roi_top = (h as f64 * (1.0 - self.params.lower_region_frac)) as usize;
        let roi = mask.slice(s![roi_top.., ..]);

        let m = img_proc::mask_moments(roi);
        if m.m00 == 0.0 {
            return None;
        }

        let centroid_x = m.m10 / m.m00;
        Some(centroid_x.round() as i32 - (w / 2) as i32)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use image::Rgb;

    const GROUND: [u8; 3] = [220, 220, 220];
    const TRACK: [u8; 3] = [20, 20, 20];

    fn follower() -> LaneFollower {
        LaneFollower::with_params(Params {
            bin_threshold: 127,
            lower_region_frac: 0.4,
        })
    }

    fn frame_with_stripe(x0: u32, x1: u32) -> RgbImage {
        let mut frame = RgbImage::from_pixel(640, 480, Rgb(GROUND));
        for y in 300..480 {
            for x in x0..=x1 {
                frame.put_pixel(x, y, Rgb(TRACK));
            }
        }
        frame
    }

    #[test]
    fn test_blank_lower_region_is_no_lane() {
        let frame = RgbImage::from_pixel(640, 480, Rgb(GROUND));
        assert_eq!(follower().estimate(&frame), None);
    }

    #[test]
    fn test_centred_track_has_zero_offset() {
        // Stripe symmetric about x = 320: pixel centres 300..=340 average
        // exactly to 320
        let frame = frame_with_stripe(300, 340);
        assert_eq!(follower().estimate(&frame), Some(0));
    }

    #[test]
    fn test_offset_sign() {
        // Track to the right of centre gives a positive offset
        let frame = frame_with_stripe(400, 440);
        assert_eq!(follower().estimate(&frame), Some(100));

        // And to the left, negative
        let frame = frame_with_stripe(200, 240);
        assert_eq!(follower().estimate(&frame), Some(-100));
    }

    #[test]
    fn test_track_above_roi_is_ignored() {
        let mut frame = RgbImage::from_pixel(640, 480, Rgb(GROUND));
        // Dark band entirely above the lower 40% of the frame
        for y in 0..200 {
            for x in 0..640 {
                frame.put_pixel(x, y, Rgb(TRACK));
            }
        }
        assert_eq!(follower().estimate(&frame), None);
    }
}
