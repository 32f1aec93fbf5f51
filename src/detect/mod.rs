//! Detection capability seam and the bundled ONNX detector.

mod onnx;
mod types;

pub use onnx::OnnxDetector;
pub use types::{PixelBox, RawDetection};

use crate::error::Result;
use crate::raster::Tile;

/// An object detector: pixel tile in, scored polygon instances out.
///
/// Implementations may return an empty sequence for a tile with no
/// detections. A failure is fatal to the pipeline; no retry policy
/// exists here.
pub trait Detector {
    /// Run detection on a single tile payload.
    fn infer(&self, tile: &Tile) -> Result<Vec<RawDetection>>;
}
