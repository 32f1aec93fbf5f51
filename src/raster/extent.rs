//! Raster extent descriptor.

use crate::geo::AffineTransform;

/// Immutable descriptor of an opened raster.
///
/// Created once when the raster is opened and read-only thereafter.
#[derive(Debug, Clone)]
pub struct RasterExtent {
    /// Raster width in pixels.
    pub width: usize,
    /// Raster height in pixels.
    pub height: usize,
    /// Number of bands in the source.
    pub bands: usize,
    /// Global geotransform anchored at the raster's top-left corner.
    pub transform: AffineTransform,
    /// Coordinate reference system identifier (e.g. `EPSG:32633`), if
    /// one could be determined.
    pub crs: Option<String>,
}

impl RasterExtent {
    /// Total number of tiles a stream over this extent will visit
    /// (before any failed-window omissions).
    pub fn tile_count(&self, tile_w: usize, tile_h: usize) -> usize {
        if tile_w == 0 || tile_h == 0 {
            return 0;
        }
        self.width.div_ceil(tile_w) * self.height.div_ceil(tile_h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extent(width: usize, height: usize) -> RasterExtent {
        RasterExtent {
            width,
            height,
            bands: 3,
            transform: AffineTransform::from_coefficients([0.0, 1.0, 0.0, 0.0, 0.0, -1.0]),
            crs: None,
        }
    }

    #[test]
    fn test_tile_count_exact_fit() {
        assert_eq!(extent(1024, 1024).tile_count(512, 512), 4);
    }

    #[test]
    fn test_tile_count_with_remainder() {
        assert_eq!(extent(1024, 768).tile_count(512, 512), 4);
        assert_eq!(extent(1025, 768).tile_count(512, 512), 6);
    }

    #[test]
    fn test_tile_count_zero_tile_size() {
        assert_eq!(extent(1024, 768).tile_count(0, 512), 0);
    }
}
