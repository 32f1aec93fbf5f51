//! Raw detection types produced by a [`crate::detect::Detector`].

/// Axis-aligned bounding box in tile pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBox {
    /// Left edge.
    pub x_min: f32,
    /// Top edge.
    pub y_min: f32,
    /// Right edge.
    pub x_max: f32,
    /// Bottom edge.
    pub y_max: f32,
}

impl PixelBox {
    /// Box area in square pixels (zero for degenerate boxes).
    pub fn area(&self) -> f32 {
        (self.x_max - self.x_min).max(0.0) * (self.y_max - self.y_min).max(0.0)
    }

    /// Intersection-over-union with another box.
    pub fn iou(&self, other: &Self) -> f32 {
        let ix = (self.x_max.min(other.x_max) - self.x_min.max(other.x_min)).max(0.0);
        let iy = (self.y_max.min(other.y_max) - self.y_min.max(other.y_min)).max(0.0);
        let inter = ix * iy;
        let union = self.area() + other.area() - inter;
        if union <= 0.0 { 0.0 } else { inter / union }
    }
}

/// A single detected instance in tile pixel space.
///
/// A complete instance carries both a bounding box and at least one mask
/// ring; the pipeline discards partial instances rather than persisting
/// them.
#[derive(Debug, Clone)]
pub struct RawDetection {
    /// Detection confidence in `[0, 1]`.
    pub confidence: f32,
    /// Bounding box, if the detector produced one.
    pub bbox: Option<PixelBox>,
    /// Mask polygon rings as ordered `(px, py)` vertex sequences.
    pub rings: Vec<Vec<(f64, f64)>>,
}

impl RawDetection {
    /// Whether this instance carries both a box and a non-empty ring.
    pub fn is_complete(&self) -> bool {
        self.bbox.is_some() && self.rings.iter().any(|r| !r.is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_iou_disjoint() {
        let a = PixelBox { x_min: 0.0, y_min: 0.0, x_max: 10.0, y_max: 10.0 };
        let b = PixelBox { x_min: 20.0, y_min: 20.0, x_max: 30.0, y_max: 30.0 };
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_identical() {
        let a = PixelBox { x_min: 0.0, y_min: 0.0, x_max: 10.0, y_max: 10.0 };
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_half_overlap() {
        let a = PixelBox { x_min: 0.0, y_min: 0.0, x_max: 10.0, y_max: 10.0 };
        let b = PixelBox { x_min: 5.0, y_min: 0.0, x_max: 15.0, y_max: 10.0 };
        // intersection 50, union 150
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_completeness() {
        let complete = RawDetection {
            confidence: 0.9,
            bbox: Some(PixelBox { x_min: 0.0, y_min: 0.0, x_max: 1.0, y_max: 1.0 }),
            rings: vec![vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]],
        };
        assert!(complete.is_complete());

        let no_box = RawDetection { bbox: None, ..complete.clone() };
        assert!(!no_box.is_complete());

        let no_ring = RawDetection { rings: vec![], ..complete.clone() };
        assert!(!no_ring.is_complete());

        let empty_ring = RawDetection { rings: vec![vec![]], ..complete };
        assert!(!empty_ring.is_complete());
    }
}
