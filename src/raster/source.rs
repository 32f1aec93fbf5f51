//! Raster source capability seam.

use crate::error::Result;
use crate::raster::RasterExtent;
use ndarray::Array3;

/// A readable georeferenced raster.
///
/// Implementations own whatever handle the underlying driver needs; the
/// pipeline acquires a source once at start and holds it for its entire
/// run. Window reads are synchronous.
pub trait RasterSource {
    /// Extent descriptor captured when the raster was opened.
    fn extent(&self) -> &RasterExtent;

    /// Read a pixel window as a `(height, width, bands)` array.
    ///
    /// Returns `Ok(None)` when the driver cannot produce data for the
    /// window; callers treat that window as absent rather than failing.
    fn read_window(&self, x: usize, y: usize, w: usize, h: usize) -> Result<Option<Array3<u8>>>;
}
