//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "orthoscan";

/// Default tile edge length in pixels for streaming the raster.
pub const DEFAULT_TILE_SIZE: usize = 512;

/// Default result buffer capacity in bytes before a flush is forced.
pub const DEFAULT_BUFFER_CAPACITY: usize = 25 * 1024 * 1024;

/// Default minimum confidence threshold for detections.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.25;

/// Number of bands a tile payload carries after channel truncation.
pub const TILE_BANDS: usize = 3;

/// Analytic memory model for result buffer accounting.
///
/// The buffer's running size estimate is computed from an entry's shape,
/// never by walking runtime object graphs, so it is reproducible across
/// implementations.
pub mod memory_model {
    /// Fixed per-entry overhead (struct plus ring vector header).
    pub const ENTRY_OVERHEAD_BYTES: usize = 56;

    /// Cost of one geospatial coordinate pair (two f64 values).
    pub const COORD_PAIR_BYTES: usize = 16;

    /// Cost of the confidence scalar.
    pub const CONFIDENCE_BYTES: usize = 4;
}

/// Output file extensions by format.
pub mod output_extensions {
    /// Newline-delimited GeoJSON feature extension.
    pub const GEOJSONL: &str = ".detections.geojsonl";
    /// CSV output extension.
    pub const CSV: &str = ".detections.csv";
}

/// Confidence value bounds.
pub mod confidence {
    /// Minimum valid confidence value.
    pub const MIN: f32 = 0.0;
    /// Maximum valid confidence value.
    pub const MAX: f32 = 1.0;
    /// Decimal places for confidence formatting.
    pub const DECIMAL_PLACES: usize = 4;
}

/// Detector post-processing constants.
pub mod detector {
    /// IoU threshold for non-maximum suppression.
    pub const NMS_IOU_THRESHOLD: f32 = 0.45;

    /// Threshold for binarizing composed instance masks.
    pub const MASK_THRESHOLD: f32 = 0.5;

    /// Upper bound on anchors accepted from a model output, guarding
    /// against malformed models requesting absurd allocations.
    pub const MAX_MODEL_ANCHORS: usize = 65_536;
}

/// Raster file extensions recognized when collecting inputs.
pub const RASTER_EXTENSIONS: &[&str] = &["tif", "tiff", "png", "jpg", "jpeg"];

/// Generic world file sidecar extension, tried after the format-specific
/// one (`.tfw`, `.pgw`, `.jgw`).
pub const GENERIC_WORLD_FILE_EXTENSION: &str = "wld";
