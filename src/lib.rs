//! Orthoscan - streaming object detection over large orthophotos.
//!
//! This crate streams a georeferenced raster as fixed-size tiles, runs
//! an object detector per tile, projects detected polygons to
//! geospatial coordinates and persists them to a vector store under a
//! bounded memory budget.

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod constants;
pub mod detect;
pub mod error;
pub mod geo;
pub mod output;
pub mod pipeline;
pub mod raster;

use clap::Parser;
use cli::{AnalyzeArgs, Cli, Command};
use config::{Config, OutputFormat, config_file_path, load_default_config, save_default_config};
use detect::OnnxDetector;
use output::{CsvStore, FanoutStore, GeoJsonStore, PersistenceStore};
use pipeline::{PipelineOptions, collect_input_files, output_dir_for, output_path_for,
    process_raster};
use raster::{RasterSource, WorldFileRaster};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub use error::{Error, Result};

/// Main entry point for the orthoscan CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.analyze.verbose, cli.analyze.quiet);

    let config = load_default_config()?;

    if let Some(command) = cli.command {
        return handle_command(command, &config);
    }

    if cli.inputs.is_empty() {
        use clap::CommandFactory;
        let mut command = Cli::command();
        command.print_help()?;
        std::process::exit(0);
    }

    analyze_rasters(&cli.inputs, &cli.analyze, &config)
}

/// Analyze input rasters with the given options.
fn analyze_rasters(inputs: &[PathBuf], args: &AnalyzeArgs, config: &Config) -> Result<()> {
    use crate::output::progress;
    use std::time::Instant;

    let total_start = Instant::now();

    let files = collect_input_files(inputs)?;
    if files.is_empty() {
        return Err(Error::NoValidRasterFiles);
    }

    info!("Found {} raster(s) to process", files.len());

    // Resolve model path and settings, CLI over config
    let model_path = args
        .model
        .clone()
        .or_else(|| config.model.as_ref().map(|m| m.path.clone()))
        .ok_or_else(|| Error::ConfigValidation {
            message: "no model specified (use -m or set model.path in config)".to_string(),
        })?;

    let min_confidence = args.min_confidence.unwrap_or(config.defaults.min_confidence);
    if !(constants::confidence::MIN..=constants::confidence::MAX).contains(&min_confidence) {
        return Err(Error::ConfigValidation {
            message: format!("min_confidence {min_confidence} not in [0, 1]"),
        });
    }
    let tile_size = args.tile_size.unwrap_or(config.defaults.tile_size);
    let capacity_bytes = args
        .buffer_capacity
        .map_or(config.defaults.buffer_capacity, |mib| mib * 1024 * 1024);
    let formats = args
        .format
        .clone()
        .unwrap_or_else(|| config.defaults.formats.clone());
    let scan_order = args.scan_order.unwrap_or(config.defaults.scan_order);
    let progress_enabled = !args.quiet && !args.no_progress;

    info!("Loading model: {}", model_path.display());
    let detector = OnnxDetector::new(&model_path, min_confidence)?;

    let options = PipelineOptions {
        tile_width: tile_size,
        tile_height: tile_size,
        capacity_bytes,
        scan_order: scan_order.into(),
        progress_enabled,
    };
    options.validate()?;

    let file_progress = progress::create_file_progress(files.len(), progress_enabled);

    let mut processed = 0usize;
    let mut errors = 0usize;
    let mut total_detections = 0usize;
    let mut total_tiles = 0usize;

    for file in &files {
        let output_dir = output_dir_for(file, args.output_dir.as_deref());
        match process_one(file, &output_dir, &detector, &formats, &options) {
            Ok(summary) => {
                processed += 1;
                total_detections += summary.detections;
                total_tiles += summary.tiles_streamed;
            }
            Err(e) => {
                error!("Failed to process {}: {}", file.display(), e);
                errors += 1;
                if args.fail_fast {
                    progress::finish_progress(file_progress, "Failed");
                    return Err(e);
                }
            }
        }
        progress::inc_progress(file_progress.as_ref());
    }

    progress::finish_progress(file_progress, "Complete");

    let total_duration = total_start.elapsed().as_secs_f64();
    info!(
        "Complete: {} processed, {} errors, {} total detections in {:.2}s",
        processed, errors, total_detections, total_duration
    );

    if processed > 0 {
        #[allow(clippy::cast_precision_loss)]
        let avg_tiles_per_sec = if total_duration > 0.0 {
            total_tiles as f64 / total_duration
        } else {
            0.0
        };
        info!("Performance: {:.1} tiles/sec overall", avg_tiles_per_sec);
    }

    if errors > 0 && !args.fail_fast {
        warn!("{} raster(s) had errors", errors);
    }

    Ok(())
}

/// Process a single raster into the requested output stores.
fn process_one(
    file: &Path,
    output_dir: &Path,
    detector: &OnnxDetector,
    formats: &[OutputFormat],
    options: &PipelineOptions,
) -> Result<pipeline::PipelineSummary> {
    info!("Processing: {}", file.display());
    std::fs::create_dir_all(output_dir)?;

    let source = WorldFileRaster::open(file)?;

    // Without a CRS the GeoJSON layer cannot be created; fail up front
    // rather than at the first flush with work already done.
    if source.extent().crs.is_none() && formats.contains(&OutputFormat::Geojsonl) {
        return Err(Error::CrsUnavailable {
            path: file.to_path_buf(),
        });
    }

    let mut stores: Vec<Box<dyn PersistenceStore>> = formats
        .iter()
        .map(|format| {
            let path = output_path_for(file, output_dir, *format);
            match format {
                OutputFormat::Geojsonl => Box::new(GeoJsonStore::new(&path)) as Box<dyn PersistenceStore>,
                OutputFormat::Csv => Box::new(CsvStore::new(&path)),
            }
        })
        .collect();

    if stores.len() == 1 {
        let mut store = stores.remove(0);
        process_raster(&source, detector, store.as_mut(), options)
    } else {
        let mut store = FanoutStore::new(stores);
        process_raster(&source, detector, &mut store, options)
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // ORT chatter is suppressed unless explicitly asked for.
    let filter_str = if quiet {
        "warn,ort=off".to_string()
    } else {
        match verbose {
            0 => "info,ort=off".to_string(),
            1 => "debug,ort=warn".to_string(),
            2 => "trace,ort=info".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    fmt().with_env_filter(filter).init();
}

fn handle_command(command: Command, config: &Config) -> Result<()> {
    use cli::ConfigAction;

    match command {
        Command::Config { action } => match action {
            ConfigAction::Init => {
                let path = config_file_path()?;
                if path.exists() {
                    println!("Configuration file already exists: {}", path.display());
                } else {
                    let saved_path = save_default_config(&Config::default())?;
                    println!("Created configuration file: {}", saved_path.display());
                    println!("\nNext step: set model.path to your ONNX detector.");
                }
                Ok(())
            }
            ConfigAction::Show => {
                println!("{config:#?}");
                Ok(())
            }
            ConfigAction::Path => {
                let path = config_file_path()?;
                println!("{}", path.display());
                Ok(())
            }
        },
    }
}
