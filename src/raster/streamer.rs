//! Lazy tile streaming over a raster extent.

use crate::constants::TILE_BANDS;
use crate::geo::AffineTransform;
use crate::raster::RasterSource;
use ndarray::{Array3, s};
use tracing::warn;

/// Tile enumeration order.
///
/// The historic order of this pipeline is column-major (all y for a given
/// x before advancing x), and downstream consumers of the persisted
/// output may depend on it, so it remains the default. Row-major is
/// available for callers that prefer the conventional raster scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanOrder {
    /// Outer loop over x, inner loop over y (historic default).
    #[default]
    ColumnMajor,
    /// Outer loop over y, inner loop over x.
    RowMajor,
}

/// A clipped rectangular window of the source raster.
///
/// Owned exclusively by the consumer for one pipeline iteration and
/// discarded after processing.
#[derive(Debug, Clone)]
pub struct Tile {
    /// Pixel x of the tile origin in the parent raster.
    pub x: usize,
    /// Pixel y of the tile origin in the parent raster.
    pub y: usize,
    /// Tile width in pixels (clipped at the raster boundary).
    pub width: usize,
    /// Tile height in pixels (clipped at the raster boundary).
    pub height: usize,
    /// Contiguous `(height, width, band)` payload, at most 3 bands.
    pub pixels: Array3<u8>,
    /// Geotransform re-anchored to this tile's origin.
    pub transform: AffineTransform,
}

impl Tile {
    /// Whether every pixel value is exactly zero.
    ///
    /// All-zero tiles are padding emitted by orthophoto stitchers for
    /// areas outside the flight footprint; they carry no content.
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&v| v == 0)
    }
}

/// Finite, lazy sequence of tiles covering a raster extent.
///
/// Each call to [`TileStream::new`] starts a fresh, independent pass.
/// Tiles exactly cover `[0, W) x [0, H)` with no gaps or overlaps;
/// boundary tiles are clipped, never padded. A window whose read fails
/// or returns no data is omitted from the sequence with a warning.
pub struct TileStream<'a, S: RasterSource + ?Sized> {
    source: &'a S,
    tile_w: usize,
    tile_h: usize,
    order: ScanOrder,
    outer: usize,
    inner: usize,
    done: bool,
}

impl<'a, S: RasterSource + ?Sized> TileStream<'a, S> {
    /// Start a new pass over `source` with the given tile dimensions.
    ///
    /// A zero tile dimension produces an empty stream.
    pub fn new(source: &'a S, tile_w: usize, tile_h: usize, order: ScanOrder) -> Self {
        let done = tile_w == 0 || tile_h == 0;
        Self {
            source,
            tile_w,
            tile_h,
            order,
            outer: 0,
            inner: 0,
            done,
        }
    }

    /// Advance the scan cursor, returning the origin it pointed at, or
    /// `None` once the extent is exhausted.
    fn next_origin(&mut self) -> Option<(usize, usize)> {
        if self.done {
            return None;
        }
        let extent = self.source.extent();
        let (outer_limit, inner_limit, outer_step, inner_step) = match self.order {
            ScanOrder::ColumnMajor => (extent.width, extent.height, self.tile_w, self.tile_h),
            ScanOrder::RowMajor => (extent.height, extent.width, self.tile_h, self.tile_w),
        };
        if outer_limit == 0 || inner_limit == 0 || self.outer >= outer_limit {
            self.done = true;
            return None;
        }

        let origin = match self.order {
            ScanOrder::ColumnMajor => (self.outer, self.inner),
            ScanOrder::RowMajor => (self.inner, self.outer),
        };

        self.inner += inner_step;
        if self.inner >= inner_limit {
            self.inner = 0;
            self.outer += outer_step;
            if self.outer >= outer_limit {
                self.done = true;
            }
        }

        Some(origin)
    }
}

impl<S: RasterSource + ?Sized> Iterator for TileStream<'_, S> {
    type Item = Tile;

    fn next(&mut self) -> Option<Tile> {
        loop {
            let (x, y) = self.next_origin()?;
            let extent = self.source.extent();
            let width = self.tile_w.min(extent.width - x);
            let height = self.tile_h.min(extent.height - y);

            match self.source.read_window(x, y, width, height) {
                Ok(Some(pixels)) => {
                    let transform = extent.transform.anchored_at(x, y);
                    return Some(Tile {
                        x,
                        y,
                        width,
                        height,
                        pixels: truncate_bands(pixels),
                        transform,
                    });
                }
                Ok(None) => {
                    warn!("window ({x},{y}) {width}x{height} returned no data, skipping");
                }
                Err(e) => {
                    warn!("window ({x},{y}) {width}x{height} read failed, skipping: {e}");
                }
            }
        }
    }
}

/// Drop bands beyond the first 3 and make the payload contiguous.
fn truncate_bands(pixels: Array3<u8>) -> Array3<u8> {
    if pixels.shape()[2] <= TILE_BANDS {
        return pixels.as_standard_layout().to_owned();
    }
    pixels
        .slice(s![.., .., ..TILE_BANDS])
        .as_standard_layout()
        .to_owned()
}
