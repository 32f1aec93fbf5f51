//! Six-coefficient affine geotransform.

/// Affine mapping from pixel coordinates to geospatial coordinates.
///
/// Coefficients follow the de-facto raster convention
/// `(origin_x, pixel_w, row_rotation, origin_y, col_rotation, pixel_h)`,
/// anchored at the top-left *corner* of the top-left pixel. Pixel
/// `(px, py)` maps to:
///
/// ```text
/// lon = origin_x + px * pixel_w      + py * row_rotation
/// lat = origin_y + px * col_rotation + py * pixel_h
/// ```
///
/// All arithmetic is f64: sub-meter pixel resolutions are routinely
/// combined with projected offsets in the 1e6..1e7 range, which f32
/// cannot represent without losing the resolution entirely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    /// Geospatial x of the top-left corner.
    pub origin_x: f64,
    /// West-east pixel resolution.
    pub pixel_w: f64,
    /// Row rotation (typically zero).
    pub row_rotation: f64,
    /// Geospatial y of the top-left corner.
    pub origin_y: f64,
    /// Column rotation (typically zero).
    pub col_rotation: f64,
    /// North-south pixel resolution (negative for north-up rasters).
    pub pixel_h: f64,
}

impl AffineTransform {
    /// Build a transform from the conventional 6-coefficient array.
    pub const fn from_coefficients(c: [f64; 6]) -> Self {
        Self {
            origin_x: c[0],
            pixel_w: c[1],
            row_rotation: c[2],
            origin_y: c[3],
            col_rotation: c[4],
            pixel_h: c[5],
        }
    }

    /// The transform as the conventional 6-coefficient array.
    pub const fn coefficients(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_w,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_h,
        ]
    }

    /// Map a single pixel coordinate to a geospatial coordinate.
    pub fn project_point(&self, px: f64, py: f64) -> (f64, f64) {
        let lon = self.origin_x + px * self.pixel_w + py * self.row_rotation;
        let lat = self.origin_y + px * self.col_rotation + py * self.pixel_h;
        (lon, lat)
    }

    /// Map an ordered pixel ring to a geospatial ring.
    ///
    /// Applied independently per vertex; vertex order is preserved and an
    /// empty ring yields an empty ring.
    pub fn project_ring(&self, pixel_ring: &[(f64, f64)]) -> Vec<(f64, f64)> {
        pixel_ring
            .iter()
            .map(|&(px, py)| self.project_point(px, py))
            .collect()
    }

    /// Re-anchor the transform to a tile whose top-left pixel sits at
    /// `(x, y)` in the parent raster.
    ///
    /// Only the origin shifts; resolutions and rotations are unchanged, so
    /// projecting tile-local pixel `(0, 0)` through the result equals
    /// projecting `(x, y)` through `self`.
    #[allow(clippy::cast_precision_loss)]
    pub fn anchored_at(&self, x: usize, y: usize) -> Self {
        let (origin_x, origin_y) = self.project_point(x as f64, y as f64);
        Self {
            origin_x,
            origin_y,
            ..*self
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn utm_transform() -> AffineTransform {
        // Typical drone orthophoto: 3cm pixels, UTM offsets in the millions
        AffineTransform::from_coefficients([
            452_318.23,
            0.03,
            0.0,
            6_112_945.87,
            0.0,
            -0.03,
        ])
    }

    #[test]
    fn test_project_origin_yields_origin_coefficients() {
        let t = utm_transform();
        assert_eq!(t.project_point(0.0, 0.0), (452_318.23, 6_112_945.87));
    }

    #[test]
    fn test_project_point_applies_resolution() {
        let t = utm_transform();
        let (lon, lat) = t.project_point(100.0, 200.0);
        assert!((lon - (452_318.23 + 3.0)).abs() < 1e-9);
        assert!((lat - (6_112_945.87 - 6.0)).abs() < 1e-9);
    }

    #[test]
    fn test_project_ring_preserves_order_and_length() {
        let t = utm_transform();
        let ring = vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        let projected = t.project_ring(&ring);
        assert_eq!(projected.len(), 4);
        assert_eq!(projected[0], t.project_point(0.0, 0.0));
        assert_eq!(projected[3], t.project_point(0.0, 10.0));
    }

    #[test]
    fn test_project_empty_ring() {
        let t = utm_transform();
        assert!(t.project_ring(&[]).is_empty());
    }

    #[test]
    fn test_reanchor_round_trip() {
        let t = utm_transform();
        let anchored = t.anchored_at(512, 1024);
        assert_eq!(anchored.project_point(0.0, 0.0), t.project_point(512.0, 1024.0));
        assert_eq!(anchored.pixel_w, t.pixel_w);
        assert_eq!(anchored.pixel_h, t.pixel_h);
        assert_eq!(anchored.row_rotation, t.row_rotation);
        assert_eq!(anchored.col_rotation, t.col_rotation);
    }

    #[test]
    fn test_reanchor_with_rotation_terms() {
        let t = AffineTransform::from_coefficients([100.0, 1.0, 0.1, 200.0, 0.2, -1.0]);
        let anchored = t.anchored_at(10, 20);
        // a' = a + x*b + y*c, d' = d + x*e + y*f
        assert_eq!(anchored.origin_x, 100.0 + 10.0 * 1.0 + 20.0 * 0.1);
        assert_eq!(anchored.origin_y, 200.0 + 10.0 * 0.2 + 20.0 * -1.0);
    }

    #[test]
    fn test_coefficients_round_trip() {
        let c = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(AffineTransform::from_coefficients(c).coefficients(), c);
    }
}
