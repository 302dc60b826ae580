//! # Camera Client
//!
//! Frame acquisition facade. A frame source yields at most one frame per
//! cycle; `None` signals a transient capture failure and never raises. The
//! directory source replays a recorded run for closed-loop testing.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::RgbImage;
use log::{debug, warn};
use std::path::{Path, PathBuf};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of camera frames, polled once per cycle.
pub trait FrameSource {
    /// Acquire the next frame, or `None` on a transient capture failure.
    fn acquire(&mut self) -> Option<RgbImage>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Frame source replaying the images of a directory in name order.
pub struct DirCamClient {
    frame_paths: Vec<PathBuf>,
    next: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CamClientError {
    #[error("Cannot read the frame directory {0:?}: {1}")]
    DirReadError(PathBuf, std::io::Error),

    #[error("The frame directory {0:?} contains no frames")]
    NoFrames(PathBuf),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DirCamClient {
    /// Create a new directory frame source from all PNG/JPEG files in the
    /// given directory.
    pub fn new(dir: &Path) -> Result<Self, CamClientError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| CamClientError::DirReadError(dir.to_path_buf(), e))?;

        let mut frame_paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("png") | Some("jpg") | Some("jpeg")
                )
            })
            .collect();

        if frame_paths.is_empty() {
            return Err(CamClientError::NoFrames(dir.to_path_buf()));
        }

        frame_paths.sort();

        debug!("DirCamClient: {} frame(s) in {:?}", frame_paths.len(), dir);

        Ok(Self {
            frame_paths,
            next: 0,
        })
    }
}

impl FrameSource for DirCamClient {
    fn acquire(&mut self) -> Option<RgbImage> {
        let path = self.frame_paths.get(self.next)?;
        self.next += 1;

        // A frame that fails to decode is a transient failure: warn and skip
        match image::open(path) {
            Ok(img) => Some(img.to_rgb8()),
            Err(e) => {
                warn!("Could not decode frame {:?}: {}", path, e);
                None
            }
        }
    }
}
