//! Configuration type definitions.

use crate::constants::{DEFAULT_BUFFER_CAPACITY, DEFAULT_MIN_CONFIDENCE, DEFAULT_TILE_SIZE};
use crate::raster::ScanOrder;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Detector model settings.
    #[serde(default)]
    pub model: Option<ModelConfig>,

    /// Default settings.
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Configuration for the detector model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the ONNX model file.
    pub path: PathBuf,
}

/// Default analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Tile edge length in pixels.
    pub tile_size: usize,

    /// Result buffer capacity in bytes.
    pub buffer_capacity: usize,

    /// Minimum confidence threshold.
    pub min_confidence: f32,

    /// Output formats.
    pub formats: Vec<OutputFormat>,

    /// Tile enumeration order.
    pub scan_order: ScanOrderConfig,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            formats: vec![OutputFormat::Geojsonl],
            scan_order: ScanOrderConfig::ColumnMajor,
        }
    }
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Newline-delimited GeoJSON features.
    Geojsonl,
    /// CSV with WKT polygon geometry.
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Geojsonl => write!(f, "geojsonl"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// Serializable scan order setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ScanOrderConfig {
    /// Columns first (historic default).
    #[default]
    ColumnMajor,
    /// Rows first.
    RowMajor,
}

impl From<ScanOrderConfig> for ScanOrder {
    fn from(value: ScanOrderConfig) -> Self {
        match value {
            ScanOrderConfig::ColumnMajor => Self::ColumnMajor,
            ScanOrderConfig::RowMajor => Self::RowMajor,
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = DefaultsConfig::default();
        assert_eq!(defaults.tile_size, 512);
        assert_eq!(defaults.buffer_capacity, 25 * 1024 * 1024);
        assert_eq!(defaults.formats, vec![OutputFormat::Geojsonl]);
        assert_eq!(defaults.scan_order, ScanOrderConfig::ColumnMajor);
    }

    #[test]
    fn test_scan_order_conversion() {
        assert_eq!(ScanOrder::from(ScanOrderConfig::ColumnMajor), ScanOrder::ColumnMajor);
        assert_eq!(ScanOrder::from(ScanOrderConfig::RowMajor), ScanOrder::RowMajor);
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Geojsonl.to_string(), "geojsonl");
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
    }
}
