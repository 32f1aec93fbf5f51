//! Bounded in-memory result buffer.

use crate::output::DetectionResult;

/// Ordered buffer of detection results with a running byte estimate.
///
/// Insertion order is persistence order. The running estimate always
/// equals the sum of the per-entry contributions of the buffered
/// entries; [`ResultBuffer::clear`] resets it to exactly zero.
#[derive(Debug, Default)]
pub struct ResultBuffer {
    entries: Vec<DetectionResult>,
    estimated_bytes: usize,
}

impl ResultBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, charging its analytic size to the running total.
    pub fn append(&mut self, entry: DetectionResult) {
        self.estimated_bytes += entry.estimated_size();
        self.entries.push(entry);
    }

    /// Current analytic size estimate in bytes.
    pub fn estimated_size(&self) -> usize {
        self.estimated_bytes
    }

    /// Number of buffered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the buffer holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Buffered entries in insertion order.
    pub fn entries(&self) -> &[DetectionResult] {
        &self.entries
    }

    /// Drop all entries and reset the running total to zero.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.estimated_bytes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(vertices: usize) -> DetectionResult {
        DetectionResult {
            confidence: 0.7,
            geospatial_ring: vec![(1.0, 2.0); vertices],
        }
    }

    #[test]
    fn test_estimate_is_sum_of_contributions() {
        let mut buffer = ResultBuffer::new();
        let entries = [entry(3), entry(10), entry(0)];
        let expected: usize = entries.iter().map(DetectionResult::estimated_size).sum();
        for e in entries {
            buffer.append(e);
        }
        assert_eq!(buffer.estimated_size(), expected);
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_clear_resets_to_exactly_zero() {
        let mut buffer = ResultBuffer::new();
        buffer.append(entry(100));
        buffer.append(entry(5));
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.estimated_size(), 0);
    }

    #[test]
    fn test_append_after_clear_accumulates_fresh() {
        let mut buffer = ResultBuffer::new();
        buffer.append(entry(4));
        buffer.clear();
        buffer.append(entry(4));
        assert_eq!(buffer.estimated_size(), entry(4).estimated_size());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut buffer = ResultBuffer::new();
        for vertices in [1, 2, 3] {
            buffer.append(entry(vertices));
        }
        let lengths: Vec<usize> =
            buffer.entries().iter().map(|e| e.geospatial_ring.len()).collect();
        assert_eq!(lengths, vec![1, 2, 3]);
    }
}
