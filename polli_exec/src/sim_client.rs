//! # Simulation Client
//!
//! A scripted simulation world standing in for the camera and the arm, so
//! the executable runs a full closed-loop mission with no hardware: frames
//! show Perlin-textured ground, a swaying track marking and a periodically
//! spawning target flower which drifts towards the approach point; the
//! simulated effector paints the pollination marker the verifier then finds.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::{Rgb, RgbImage};
use log::{debug, info};
use noise::{NoiseFn, Perlin};
use serde::Deserialize;
use std::cell::RefCell;
use std::rc::Rc;

use crate::arm_client::{ArmClientError, PolliEffector, PolliRequest};
use crate::cam_client::FrameSource;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Ground base colour: green, outside every detection band.
const GROUND_RGB: [f64; 3] = [90.0, 150.0, 90.0];

/// Track marking colour: dark enough for the lane mask, too bright for the
/// obstacle band.
const TRACK_RGB: [u8; 3] = [50, 50, 50];

/// Target flower colour: course yellow.
const FLOWER_RGB: [u8; 3] = [255, 200, 0];

/// Pollination marker colour.
const MARKER_RGB: [u8; 3] = [255, 255, 255];

/// Obstacle colour.
const OBSTACLE_RGB: [u8; 3] = [10, 10, 10];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the simulated world.
#[derive(Debug, Clone, Deserialize)]
pub struct SimParams {
    /// Frame width.
    ///
    /// Units: pixels
    pub frame_width_px: u32,

    /// Frame height.
    ///
    /// Units: pixels
    pub frame_height_px: u32,

    /// Half-width of the track stripe.
    ///
    /// Units: pixels
    pub track_half_width_px: u32,

    /// Amplitude of the track sway around the frame centre.
    ///
    /// Units: pixels
    pub track_sway_amp_px: f64,

    /// Period of the track sway.
    ///
    /// Units: cycles
    pub track_sway_period_cycles: u64,

    /// Length of one flower lifecycle.
    ///
    /// Units: cycles
    pub flower_period_cycles: u64,

    /// Lane-only part at the start of each flower lifecycle.
    ///
    /// Units: cycles
    pub flower_delay_cycles: u64,

    /// Side of the flower square.
    ///
    /// Units: pixels
    pub flower_side_px: u32,

    /// Side of the painted marker square.
    ///
    /// Units: pixels
    pub marker_side_px: u32,

    /// Length of one obstacle appearance period.
    ///
    /// Units: cycles
    pub obstacle_period_cycles: u64,

    /// Cycles the obstacle is visible at the start of each period.
    ///
    /// Units: cycles
    pub obstacle_visible_cycles: u64,

    /// Spatial scale of the ground noise texture.
    pub noise_scale: f64,
}

/// The scripted simulation world, shared by the simulated camera and arm.
pub struct SimWorld {
    params: SimParams,
    perlin: Perlin,
    cycle: u64,

    /// Whether the flower of the current lifecycle has been pollinated.
    pollinated: bool,
}

/// Frame source rendering the simulated world.
pub struct SimCamClient {
    world: Rc<RefCell<SimWorld>>,
}

/// Simulated pollination effector: always completes its sequence and paints
/// the marker into the world.
pub struct SimArmClient {
    world: Rc<RefCell<SimWorld>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimWorld {
    pub fn new(params: SimParams) -> Rc<RefCell<Self>> {
        info!(
            "SimWorld created: {}x{} px, flower every {} cycle(s)",
            params.frame_width_px, params.frame_height_px, params.flower_period_cycles
        );

        Rc::new(RefCell::new(Self {
            params,
            perlin: Perlin::new(),
            cycle: 0,
            pollinated: false,
        }))
    }

    /// Advance the world by one cycle.
    fn advance(&mut self) {
        self.cycle += 1;

        // A new lifecycle brings a fresh, unpollinated flower
        if self.cycle % self.params.flower_period_cycles == 0 {
            self.pollinated = false;
        }
    }

    /// Centre of the track stripe at the current cycle.
    fn track_centre_px(&self) -> f64 {
        let sway = (self.cycle as f64 * std::f64::consts::TAU
            / self.params.track_sway_period_cycles as f64)
            .sin();
        self.params.frame_width_px as f64 / 2.0 + self.params.track_sway_amp_px * sway
    }

    /// Position of the current lifecycle's flower, if it is in view.
    ///
    /// The flower spawns off-centre mid-frame and drifts towards the
    /// approach point, standing in for the rover closing in on it.
    fn flower_centre_px(&self) -> Option<(f64, f64)> {
        let phase = self.cycle % self.params.flower_period_cycles;
        if phase < self.params.flower_delay_cycles {
            return None;
        }

        let t = (phase - self.params.flower_delay_cycles) as f64
            / (self.params.flower_period_cycles - self.params.flower_delay_cycles) as f64;

        let x = self.params.frame_width_px as f64 / 2.0 + 100.0 * (1.0 - t);
        let y = 300.0 - 180.0 * t;

        Some((x, y))
    }

    fn obstacle_in_view(&self) -> bool {
        self.cycle % self.params.obstacle_period_cycles < self.params.obstacle_visible_cycles
    }

    /// Render the world into a frame.
    fn render(&self) -> RgbImage {
        let (w, h) = (self.params.frame_width_px, self.params.frame_height_px);
        let mut frame = RgbImage::new(w, h);

        // Noise-textured ground
        for y in 0..h {
            for x in 0..w {
                let n = self.perlin.get([
                    x as f64 * self.params.noise_scale,
                    y as f64 * self.params.noise_scale,
                ]);
                let gain = 1.0 + 0.1 * n;

                let px = [
                    (GROUND_RGB[0] * gain) as u8,
                    (GROUND_RGB[1] * gain) as u8,
                    (GROUND_RGB[2] * gain) as u8,
                ];
                frame.put_pixel(x, y, Rgb(px));
            }
        }

        // Track stripe in the near field
        let track_centre = self.track_centre_px();
        let track_top = (h as f64 * 0.55) as u32;
        for y in track_top..h {
            for x in 0..w {
                if (x as f64 - track_centre).abs() <= self.params.track_half_width_px as f64 {
                    frame.put_pixel(x, y, Rgb(TRACK_RGB));
                }
            }
        }

        // Occasional obstacle block beside the track
        if self.obstacle_in_view() {
            draw_square(&mut frame, 100.0, 180.0, 40, OBSTACLE_RGB);
        }

        // The flower, and its marker once pollinated
        if let Some((fx, fy)) = self.flower_centre_px() {
            draw_square(&mut frame, fx, fy, self.params.flower_side_px, FLOWER_RGB);

            if self.pollinated {
                draw_square(&mut frame, fx, fy, self.params.marker_side_px, MARKER_RGB);
            }
        }

        frame
    }
}

impl SimCamClient {
    pub fn new(world: Rc<RefCell<SimWorld>>) -> Self {
        Self { world }
    }
}

impl FrameSource for SimCamClient {
    fn acquire(&mut self) -> Option<RgbImage> {
        let mut world = self.world.borrow_mut();
        world.advance();
        Some(world.render())
    }
}

impl SimArmClient {
    pub fn new(world: Rc<RefCell<SimWorld>>) -> Self {
        Self { world }
    }
}

impl PolliEffector for SimArmClient {
    fn pollinate(&mut self, request: &PolliRequest) -> Result<bool, ArmClientError> {
        let mut world = self.world.borrow_mut();

        debug!(
            "SimArm pollinate sequence at ({:.0}, {:.0})",
            request.target_px.x, request.target_px.y
        );

        world.pollinated = true;
        Ok(true)
    }
}

impl Default for SimParams {
    fn default() -> Self {
        SimParams {
            frame_width_px: 640,
            frame_height_px: 480,
            track_half_width_px: 20,
            track_sway_amp_px: 40.0,
            track_sway_period_cycles: 200,
            flower_period_cycles: 100,
            flower_delay_cycles: 40,
            flower_side_px: 45,
            marker_side_px: 36,
            obstacle_period_cycles: 300,
            obstacle_visible_cycles: 50,
            noise_scale: 0.05,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Draw a filled axis-aligned square centred at the given position, clipped
/// to the frame.
fn draw_square(frame: &mut RgbImage, cx: f64, cy: f64, side_px: u32, colour: [u8; 3]) {
    let (w, h) = frame.dimensions();
    let half = side_px as f64 / 2.0;

    let x0 = (cx - half).max(0.0) as u32;
    let y0 = (cy - half).max(0.0) as u32;
    let x1 = ((cx + half) as u32).min(w);
    let y1 = ((cy + half) as u32).min(h);

    for y in y0..y1 {
        for x in x0..x1 {
            frame.put_pixel(x, y, Rgb(colour));
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
