//! Persistence store capability seam.

use crate::error::Result;
use crate::output::DetectionResult;

/// A vector store that detection features are flushed into.
///
/// The store handle is opened and closed once per flush, never held
/// across flushes, so external locks and file handles are bounded to a
/// flush's duration and each flush's writes are committed before the
/// next tile is processed.
pub trait PersistenceStore {
    /// Open the store, creating it if absent.
    ///
    /// `crs` identifies the coordinate reference system of incoming
    /// ring coordinates. A store that cannot create its layer without
    /// one fails here with [`crate::error::Error::CrsUnavailable`].
    fn open_or_create(&mut self, crs: Option<&str>) -> Result<()>;

    /// Append one feature: a confidence field and one polygon geometry.
    ///
    /// Implementations close the ring (first vertex = last) if their
    /// format requires closure.
    fn append_feature(&mut self, result: &DetectionResult) -> Result<()>;

    /// Close the store, committing appended features.
    fn close(&mut self) -> Result<()>;
}

/// Drives several stores in lockstep.
///
/// One streaming pass can persist to every requested output format
/// without buffering results twice; each flush opens, fills and closes
/// all member stores in order.
#[derive(Default)]
pub struct FanoutStore {
    stores: Vec<Box<dyn PersistenceStore>>,
}

impl FanoutStore {
    /// Create a fan-out over the given stores.
    pub fn new(stores: Vec<Box<dyn PersistenceStore>>) -> Self {
        Self { stores }
    }
}

impl PersistenceStore for FanoutStore {
    fn open_or_create(&mut self, crs: Option<&str>) -> Result<()> {
        for store in &mut self.stores {
            store.open_or_create(crs)?;
        }
        Ok(())
    }

    fn append_feature(&mut self, result: &DetectionResult) -> Result<()> {
        for store in &mut self.stores {
            store.append_feature(result)?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        for store in &mut self.stores {
            store.close()?;
        }
        Ok(())
    }
}
