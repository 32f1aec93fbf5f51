//! Buffer flush policy and persistence bridge.

use crate::error::Result;
use crate::output::{PersistenceStore, ResultBuffer};
use tracing::{debug, info};

/// Decides when the result buffer must be drained and performs the
/// drain.
///
/// A drain is all-or-nothing with respect to the buffer: the store is
/// opened, every entry appended in insertion order, the store closed,
/// and only then is the buffer cleared. Any persistence failure
/// propagates with the buffer left intact, so no data is silently lost.
#[derive(Debug, Clone, Copy)]
pub struct FlushPolicy {
    capacity_bytes: usize,
}

impl FlushPolicy {
    /// Policy triggering once the buffer estimate exceeds
    /// `capacity_bytes`.
    pub const fn new(capacity_bytes: usize) -> Self {
        Self { capacity_bytes }
    }

    /// The configured capacity threshold in bytes.
    pub const fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    /// Flush if the buffer has outgrown the threshold.
    ///
    /// Returns whether a flush happened. Called after every append, so
    /// at most one flush occurs per appended entry.
    pub fn check(
        &self,
        buffer: &mut ResultBuffer,
        store: &mut dyn PersistenceStore,
        crs: Option<&str>,
    ) -> Result<bool> {
        if buffer.estimated_size() <= self.capacity_bytes {
            return Ok(false);
        }
        debug!(
            "buffer at {} bytes exceeds capacity {}, flushing",
            buffer.estimated_size(),
            self.capacity_bytes
        );
        Self::flush(buffer, store, crs)?;
        Ok(true)
    }

    /// Drain whatever remains, regardless of the threshold.
    ///
    /// Returns whether a flush happened (an empty buffer needs none).
    pub fn finalize(
        buffer: &mut ResultBuffer,
        store: &mut dyn PersistenceStore,
        crs: Option<&str>,
    ) -> Result<bool> {
        if buffer.is_empty() {
            return Ok(false);
        }
        Self::flush(buffer, store, crs)?;
        Ok(true)
    }

    /// Hand every buffered entry to the store, then clear the buffer.
    ///
    /// The store handle lives only for the duration of this call.
    fn flush(
        buffer: &mut ResultBuffer,
        store: &mut dyn PersistenceStore,
        crs: Option<&str>,
    ) -> Result<()> {
        let count = buffer.len();
        store.open_or_create(crs)?;
        for entry in buffer.entries() {
            store.append_feature(entry)?;
        }
        store.close()?;
        buffer.clear();
        info!("flushed {count} detection(s) to store");
        Ok(())
    }
}
