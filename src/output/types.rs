//! Detection result types.

use crate::constants::memory_model::{CONFIDENCE_BYTES, COORD_PAIR_BYTES, ENTRY_OVERHEAD_BYTES};

/// One detected object: confidence plus its projected polygon ring.
///
/// Created by projecting a raw detection's pixel ring through the owning
/// tile's geotransform; immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    /// Detection confidence in the detector's output range.
    pub confidence: f32,
    /// Ordered `(lon, lat)` vertices of one polygon ring, preserving the
    /// vertex order of the source pixel ring.
    pub geospatial_ring: Vec<(f64, f64)>,
}

impl DetectionResult {
    /// Analytic size contribution of this entry in bytes.
    ///
    /// Computed from shape alone (fixed overhead, per-vertex cost, the
    /// confidence scalar) so the figure is deterministic across runs and
    /// implementations; runtime object graphs are never inspected.
    pub fn estimated_size(&self) -> usize {
        ENTRY_OVERHEAD_BYTES + self.geospatial_ring.len() * COORD_PAIR_BYTES + CONFIDENCE_BYTES
    }
}

/// Close a polygon ring so its first vertex equals its last.
///
/// Returns the ring unchanged when already closed or too short to close
/// meaningfully.
pub fn close_ring(mut ring: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    if ring.len() >= 3 && ring.first() != ring.last() {
        if let Some(&first) = ring.first() {
            ring.push(first);
        }
    }
    ring
}
