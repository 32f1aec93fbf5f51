//! Per-raster processing pipeline.

use crate::constants::{DEFAULT_BUFFER_CAPACITY, DEFAULT_TILE_SIZE};
use crate::detect::Detector;
use crate::error::{Error, Result};
use crate::output::{DetectionResult, PersistenceStore, ResultBuffer, progress};
use crate::pipeline::FlushPolicy;
use crate::raster::{RasterSource, ScanOrder, TileStream};
use tracing::{debug, info};

/// Options for running the tile pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Tile width in pixels.
    pub tile_width: usize,
    /// Tile height in pixels.
    pub tile_height: usize,
    /// Result buffer capacity in bytes before a flush is forced.
    pub capacity_bytes: usize,
    /// Tile enumeration order.
    pub scan_order: ScanOrder,
    /// Whether to render a tile progress bar.
    pub progress_enabled: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            tile_width: DEFAULT_TILE_SIZE,
            tile_height: DEFAULT_TILE_SIZE,
            capacity_bytes: DEFAULT_BUFFER_CAPACITY,
            scan_order: ScanOrder::default(),
            progress_enabled: false,
        }
    }
}

impl PipelineOptions {
    /// Validate option values.
    pub fn validate(&self) -> Result<()> {
        if self.tile_width == 0 {
            return Err(Error::InvalidTileSize { value: self.tile_width });
        }
        if self.tile_height == 0 {
            return Err(Error::InvalidTileSize { value: self.tile_height });
        }
        if self.capacity_bytes == 0 {
            return Err(Error::InvalidBufferCapacity { value: self.capacity_bytes });
        }
        Ok(())
    }
}

/// Result of processing a single raster.
#[derive(Debug)]
pub struct PipelineSummary {
    /// Number of tiles pulled from the streamer.
    pub tiles_streamed: usize,
    /// Tiles skipped as all-zero padding.
    pub tiles_skipped: usize,
    /// Detection results appended to the buffer.
    pub detections: usize,
    /// Raw instances discarded as incomplete (missing mask or box).
    pub discarded: usize,
    /// Number of flushes performed, finalization included.
    pub flushes: usize,
    /// Processing duration in seconds.
    pub duration_secs: f64,
}

/// Stream a raster through detection and drain results to the store.
///
/// Pull-based and single-threaded: one tile is in flight at a time, and
/// every store or detector call completes before the next pipeline step.
/// The raster source stays open for the whole run; the store is opened
/// and closed per flush.
pub fn process_raster(
    source: &dyn RasterSource,
    detector: &dyn Detector,
    store: &mut dyn PersistenceStore,
    options: &PipelineOptions,
) -> Result<PipelineSummary> {
    use std::time::Instant;

    options.validate()?;
    let start_time = Instant::now();

    let extent = source.extent();
    let crs = extent.crs.clone();
    let total_tiles = extent.tile_count(options.tile_width, options.tile_height);
    info!(
        "streaming {}x{} raster as up to {total_tiles} tile(s) of {}x{}",
        extent.width, extent.height, options.tile_width, options.tile_height
    );

    let tile_progress = progress::create_tile_progress(total_tiles, "tiles", options.progress_enabled);

    let mut buffer = ResultBuffer::new();
    let policy = FlushPolicy::new(options.capacity_bytes);
    let mut summary = PipelineSummary {
        tiles_streamed: 0,
        tiles_skipped: 0,
        detections: 0,
        discarded: 0,
        flushes: 0,
        duration_secs: 0.0,
    };

    for tile in TileStream::new(source, options.tile_width, options.tile_height, options.scan_order)
    {
        summary.tiles_streamed += 1;
        progress::inc_progress(tile_progress.as_ref());

        // Padding outside the flight footprint never reaches the detector
        if tile.is_blank() {
            debug!("tile ({},{}) has no content, skipping", tile.x, tile.y);
            summary.tiles_skipped += 1;
            continue;
        }

        let instances = detector.infer(&tile)?;
        for instance in instances {
            if !instance.is_complete() {
                summary.discarded += 1;
                continue;
            }
            for ring in &instance.rings {
                if ring.is_empty() {
                    continue;
                }
                buffer.append(DetectionResult {
                    confidence: instance.confidence,
                    geospatial_ring: tile.transform.project_ring(ring),
                });
                summary.detections += 1;
                if policy.check(&mut buffer, store, crs.as_deref())? {
                    summary.flushes += 1;
                }
            }
        }
    }

    if FlushPolicy::finalize(&mut buffer, store, crs.as_deref())? {
        summary.flushes += 1;
    }

    progress::finish_progress(tile_progress, "Detection complete");

    summary.duration_secs = start_time.elapsed().as_secs_f64();
    info!(
        "processed {} tile(s) ({} skipped) in {:.2}s: {} detection(s), {} flush(es)",
        summary.tiles_streamed,
        summary.tiles_skipped,
        summary.duration_secs,
        summary.detections,
        summary.flushes
    );

    Ok(summary)
}
