//! CLI argument definitions.

use crate::config::{OutputFormat, ScanOrderConfig};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Streaming object detection over large orthophotos.
#[derive(Debug, Parser)]
#[command(name = "orthoscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Input rasters or directories to analyze.
    pub inputs: Vec<PathBuf>,

    /// Common options for analysis.
    #[command(flatten)]
    pub analyze: AnalyzeArgs,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Arguments for the analyze command.
#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Path to the ONNX detector model (overrides config).
    #[arg(short, long, env = "ORTHOSCAN_MODEL")]
    pub model: Option<PathBuf>,

    /// Output formats (comma-separated: geojsonl,csv).
    #[arg(short, long, value_delimiter = ',', env = "ORTHOSCAN_FORMAT")]
    pub format: Option<Vec<OutputFormat>>,

    /// Output directory (default: same as input).
    #[arg(short, long, env = "ORTHOSCAN_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Tile edge length in pixels.
    #[arg(short, long, env = "ORTHOSCAN_TILE_SIZE")]
    pub tile_size: Option<usize>,

    /// Result buffer capacity in MiB before a flush is forced.
    #[arg(short = 'b', long, env = "ORTHOSCAN_BUFFER_CAPACITY")]
    pub buffer_capacity: Option<usize>,

    /// Minimum confidence threshold (0.0-1.0).
    #[arg(short = 'c', long, env = "ORTHOSCAN_MIN_CONFIDENCE")]
    pub min_confidence: Option<f32>,

    /// Tile enumeration order.
    #[arg(long, value_enum, env = "ORTHOSCAN_SCAN_ORDER")]
    pub scan_order: Option<ScanOrderConfig>,

    /// Stop at the first raster that fails.
    #[arg(long)]
    pub fail_fast: bool,

    /// Disable progress bars.
    #[arg(long)]
    pub no_progress: bool,

    /// Increase logging verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
