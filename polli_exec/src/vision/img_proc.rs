//! # Image processing primitives
//!
//! Low level operations shared by the vision modules: HSV conversion, colour
//! band thresholding into binary masks, binary morphology, image moments, and
//! connected component extraction with ordered boundary tracing.
//!
//! Masks are `ndarray::Array2<bool>` indexed `[row, column]`, i.e. `[y, x]`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::RgbImage;
use nalgebra::Point2;
use ndarray::{Array2, ArrayView2};
use std::collections::VecDeque;

use super::color_table::HsvBand;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Moore neighbourhood, clockwise starting west, in image coordinates
/// (x right, y down).
const MOORE_DIRS: [(i32, i32); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// A binary image mask, indexed `[y, x]`.
pub type Mask = Array2<bool>;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Zeroth and first order image moments of a mask.
#[derive(Debug, Clone, Copy, Default)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

/// An 8-connected component of a mask.
#[derive(Debug, Clone)]
pub struct Component {
    /// Component area as a pixel count (the zeroth moment)
    pub area_px: u32,

    /// First-moment centroid
    pub centroid_px: Point2<f64>,

    /// Ordered outer boundary (Moore trace, clockwise)
    pub boundary_px: Vec<Point2<u32>>,

    /// Top-left corner of the bounding box
    pub min_px: Point2<u32>,

    /// Bottom-right corner of the bounding box
    pub max_px: Point2<u32>,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert an RGB pixel to HSV.
///
/// Follows the OpenCV 8-bit convention the colour bands are tuned in: hue in
/// [0, 179] (degrees halved), saturation and value in [0, 255].
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let r = rgb[0] as f32 / 255.0;
    let g = rgb[1] as f32 / 255.0;
    let b = rgb[2] as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max;
    let s = if max > 0.0 { delta / max } else { 0.0 };

    let h_deg = if delta <= f32::EPSILON {
        0.0
    } else if (max - r).abs() <= f32::EPSILON {
        60.0 * (((g - b) / delta) % 6.0)
    } else if (max - g).abs() <= f32::EPSILON {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let h_deg = if h_deg < 0.0 { h_deg + 360.0 } else { h_deg };

    // Hue is stored halved so it fits a u8; 360 wraps to 0
    let h = ((h_deg / 2.0).round() as u16) % 180;

    [
        h as u8,
        (s * 255.0).round() as u8,
        (v * 255.0).round() as u8,
    ]
}

/// Threshold a frame against an HSV colour band, producing a binary mask.
pub fn hsv_mask(frame: &RgbImage, band: &HsvBand) -> Mask {
    let (w, h) = frame.dimensions();
    let mut mask = Array2::from_elem((h as usize, w as usize), false);

    for (x, y, px) in frame.enumerate_pixels() {
        if band.contains(rgb_to_hsv(px.0)) {
            mask[[y as usize, x as usize]] = true;
        }
    }

    mask
}

/// Threshold a frame against a luma value with inverse polarity: pixels at or
/// below the threshold (the dark track marking) paint true.
pub fn luma_mask_inv(frame: &RgbImage, threshold: u8) -> Mask {
    let (w, h) = frame.dimensions();
    let mut mask = Array2::from_elem((h as usize, w as usize), false);

    for (x, y, px) in frame.enumerate_pixels() {
        // ITU-R BT.601 luma
        let luma =
            0.299 * px.0[0] as f32 + 0.587 * px.0[1] as f32 + 0.114 * px.0[2] as f32;
        if luma <= threshold as f32 {
            mask[[y as usize, x as usize]] = true;
        }
    }

    mask
}

/// Binary erosion with a square kernel.
///
/// Pixels outside the mask are treated as background, so blobs touching the
/// border erode inwards from it.
pub fn erode(mask: &Mask, kernel_px: usize, iterations: u32) -> Mask {
    morph(mask, kernel_px, iterations, false)
}

/// Binary dilation with a square kernel.
pub fn dilate(mask: &Mask, kernel_px: usize, iterations: u32) -> Mask {
    morph(mask, kernel_px, iterations, true)
}

/// Compute the zeroth and first order moments of a mask view.
pub fn mask_moments(mask: ArrayView2<bool>) -> Moments {
    let mut m = Moments::default();

    for ((y, x), &set) in mask.indexed_iter() {
        if set {
            m.m00 += 1.0;
            m.m10 += x as f64;
            m.m01 += y as f64;
        }
    }

    m
}

/// Extract all 8-connected components of a mask, with centroids and ordered
/// outer boundaries.
///
/// Components whose zeroth moment is zero have no defined centroid and are
/// not emitted (unreachable for a flood fill, kept as an explicit guard).
pub fn extract_components(mask: &Mask) -> Vec<Component> {
    let (h, w) = mask.dim();
    let mut visited = Array2::from_elem((h, w), false);
    let mut components = Vec::new();

    for y in 0..h {
        for x in 0..w {
            if !mask[[y, x]] || visited[[y, x]] {
                continue;
            }

            // Flood fill the component, accumulating its moments and bounds
            let mut area = 0u32;
            let mut sum_x = 0f64;
            let mut sum_y = 0f64;
            let (mut min_x, mut min_y) = (x, y);
            let (mut max_x, mut max_y) = (x, y);

            let mut queue = VecDeque::new();
            visited[[y, x]] = true;
            queue.push_back((x, y));

            while let Some((cx, cy)) = queue.pop_front() {
                area += 1;
                sum_x += cx as f64;
                sum_y += cy as f64;
                min_x = min_x.min(cx);
                min_y = min_y.min(cy);
                max_x = max_x.max(cx);
                max_y = max_y.max(cy);

                for &(dx, dy) in MOORE_DIRS.iter() {
                    let nx = cx as i32 + dx;
                    let ny = cy as i32 + dy;
                    if nx < 0 || ny < 0 || nx as usize >= w || ny as usize >= h {
                        continue;
                    }
                    let (nx, ny) = (nx as usize, ny as usize);
                    if mask[[ny, nx]] && !visited[[ny, nx]] {
                        visited[[ny, nx]] = true;
                        queue.push_back((nx, ny));
                    }
                }
            }

            if area == 0 {
                continue;
            }

            // (x, y) is the first component pixel in row-major order, i.e.
            // the topmost-leftmost one, which is the required trace start
            let boundary_px = trace_boundary(mask, (x, y), 8 * area as usize + 8);

            components.push(Component {
                area_px: area,
                centroid_px: Point2::new(sum_x / area as f64, sum_y / area as f64),
                boundary_px,
                min_px: Point2::new(min_x as u32, min_y as u32),
                max_px: Point2::new(max_x as u32, max_y as u32),
            });
        }
    }

    components
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Shared erode/dilate kernel scan. `grow` selects dilation (any neighbour in
/// the window sets the pixel) over erosion (all must be set).
fn morph(mask: &Mask, kernel_px: usize, iterations: u32, grow: bool) -> Mask {
    let (h, w) = mask.dim();
    let half = (kernel_px / 2) as i32;

    let mut current = mask.clone();

    for _ in 0..iterations {
        let mut next = Array2::from_elem((h, w), false);

        for y in 0..h {
            for x in 0..w {
                let mut any = false;
                let mut all = true;

                'window: for dy in -half..=half {
                    for dx in -half..=half {
                        let nx = x as i32 + dx;
                        let ny = y as i32 + dy;
                        let set = nx >= 0
                            && ny >= 0
                            && (nx as usize) < w
                            && (ny as usize) < h
                            && current[[ny as usize, nx as usize]];

                        any |= set;
                        all &= set;

                        if grow && any {
                            break 'window;
                        }
                        if !grow && !all {
                            break 'window;
                        }
                    }
                }

                next[[y, x]] = if grow { any } else { all };
            }
        }

        current = next;
    }

    current
}

/// Moore-neighbour boundary trace, clockwise from the topmost-leftmost pixel
/// of a component. Terminates on returning to the start pixel; `cap` bounds
/// the trace length against degenerate inputs.
fn trace_boundary(mask: &Mask, start: (usize, usize), cap: usize) -> Vec<Point2<u32>> {
    let (h, w) = mask.dim();
    let at = |x: i32, y: i32| -> bool {
        x >= 0 && y >= 0 && (x as usize) < w && (y as usize) < h && mask[[y as usize, x as usize]]
    };

    let mut boundary = vec![Point2::new(start.0 as u32, start.1 as u32)];
    let (mut bx, mut by) = (start.0 as i32, start.1 as i32);

    // The scan that found the start pixel arrived from the west, so that
    // neighbour is known background: the clockwise search begins after it
    let mut back = 0usize;

    loop {
        let mut moved = false;

        for i in 1..=8 {
            let dir = (back + i) % 8;
            let nx = bx + MOORE_DIRS[dir].0;
            let ny = by + MOORE_DIRS[dir].1;

            if at(nx, ny) {
                // New backtrack: the direction from the new pixel to the
                // background pixel examined just before it
                let prev = (back + i - 1) % 8;
                let px = bx + MOORE_DIRS[prev].0;
                let py = by + MOORE_DIRS[prev].1;
                back = dir_index((px - nx, py - ny));

                bx = nx;
                by = ny;
                moved = true;
                break;
            }
        }

        // An isolated pixel has no foreground neighbour
        if !moved {
            break;
        }

        // Contour closed
        if bx as usize == start.0 && by as usize == start.1 {
            break;
        }

        boundary.push(Point2::new(bx as u32, by as u32));

        if boundary.len() >= cap {
            break;
        }
    }

    boundary
}

/// Index of a unit offset in the Moore neighbourhood.
fn dir_index(delta: (i32, i32)) -> usize {
    MOORE_DIRS
        .iter()
        .position(|&d| d == delta)
        .expect("offset between ring-adjacent pixels is always a Moore direction")
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use image::Rgb;

    fn blank_frame(w: u32, h: u32, fill: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb(fill))
    }

    fn fill_rect(frame: &mut RgbImage, x0: u32, y0: u32, w: u32, h: u32, colour: [u8; 3]) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                frame.put_pixel(x, y, Rgb(colour));
            }
        }
    }

    #[test]
    fn test_rgb_to_hsv() {
        // Pure value channel colours
        assert_eq!(rgb_to_hsv([0, 0, 0]), [0, 0, 0]);
        assert_eq!(rgb_to_hsv([255, 255, 255]), [0, 0, 255]);

        // Saturated primaries: hue is halved degrees
        assert_eq!(rgb_to_hsv([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 255]), [120, 255, 255]);

        // Course-yellow used by the flower bands sits inside [20, 30]
        let hsv = rgb_to_hsv([255, 200, 0]);
        assert!(hsv[0] >= 20 && hsv[0] <= 30, "hue was {}", hsv[0]);
        assert_eq!(hsv[1], 255);
        assert_eq!(hsv[2], 255);
    }

    #[test]
    fn test_hsv_mask_band() {
        let mut frame = blank_frame(20, 20, [10, 10, 10]);
        fill_rect(&mut frame, 5, 5, 4, 4, [255, 200, 0]);

        let band = HsvBand {
            lower: [20, 100, 100],
            upper: [30, 255, 255],
        };
        let mask = hsv_mask(&frame, &band);

        let count = mask.iter().filter(|&&s| s).count();
        assert_eq!(count, 16);
        assert!(mask[[5, 5]]);
        assert!(!mask[[0, 0]]);
    }

    #[test]
    fn test_morphology() {
        let mut mask = Array2::from_elem((20, 20), false);
        for y in 5..15 {
            for x in 5..15 {
                mask[[y, x]] = true;
            }
        }

        // A 3x3 erosion shaves one pixel off each side of a 10x10 square
        let eroded = erode(&mask, 3, 1);
        assert_eq!(eroded.iter().filter(|&&s| s).count(), 64);

        // Dilating back restores the original square
        let dilated = dilate(&eroded, 3, 1);
        assert_eq!(dilated.iter().filter(|&&s| s).count(), 100);

        // Erosion removes single-pixel speckle entirely
        let mut speckle = Array2::from_elem((10, 10), false);
        speckle[[4, 4]] = true;
        assert_eq!(erode(&speckle, 3, 1).iter().filter(|&&s| s).count(), 0);
    }

    #[test]
    fn test_mask_moments() {
        let mut mask = Array2::from_elem((10, 10), false);
        for y in 2..6 {
            for x in 4..8 {
                mask[[y, x]] = true;
            }
        }

        let m = mask_moments(mask.view());
        assert_eq!(m.m00, 16.0);
        assert!((m.m10 / m.m00 - 5.5).abs() < 1e-9);
        assert!((m.m01 / m.m00 - 3.5).abs() < 1e-9);

        let empty = Array2::from_elem((10, 10), false);
        assert_eq!(mask_moments(empty.view()).m00, 0.0);
    }

    #[test]
    fn test_extract_components() {
        let mut mask = Array2::from_elem((20, 20), false);
        // Two separated squares
        for y in 2..6 {
            for x in 2..6 {
                mask[[y, x]] = true;
            }
        }
        for y in 10..14 {
            for x in 12..18 {
                mask[[y, x]] = true;
            }
        }

        let mut comps = extract_components(&mask);
        comps.sort_by_key(|c| c.area_px);
        assert_eq!(comps.len(), 2);

        assert_eq!(comps[0].area_px, 16);
        assert!((comps[0].centroid_px.x - 3.5).abs() < 1e-9);
        assert!((comps[0].centroid_px.y - 3.5).abs() < 1e-9);

        assert_eq!(comps[1].area_px, 24);
        assert_eq!(comps[1].min_px, Point2::new(12, 10));
        assert_eq!(comps[1].max_px, Point2::new(17, 13));

        // Boundary of a 4x4 square is its 12-pixel perimeter ring
        assert_eq!(comps[0].boundary_px.len(), 12);
        assert_eq!(comps[0].boundary_px[0], Point2::new(2, 2));
    }

    #[test]
    fn test_single_pixel_component() {
        let mut mask = Array2::from_elem((5, 5), false);
        mask[[3, 2]] = true;

        let comps = extract_components(&mask);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].area_px, 1);
        assert_eq!(comps[0].boundary_px, vec![Point2::new(2, 3)]);
    }

    #[test]
    fn test_luma_mask_inv() {
        let mut frame = blank_frame(10, 10, [220, 220, 220]);
        fill_rect(&mut frame, 3, 3, 2, 2, [15, 15, 15]);

        let mask = luma_mask_inv(&frame, 127);
        assert_eq!(mask.iter().filter(|&&s| s).count(), 4);
        assert!(mask[[3, 3]]);
    }
}
