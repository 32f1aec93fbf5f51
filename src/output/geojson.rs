//! Newline-delimited GeoJSON persistence store.
//!
//! One Feature per line, append-friendly across flushes. Coordinates
//! are written in the raster's CRS, which is recorded as a foreign
//! member on each feature; the store refuses to create a layer without
//! a CRS identifier, since projected coordinates without a reference
//! system are unusable downstream.

use crate::error::{Error, Result};
use crate::output::{DetectionResult, PersistenceStore, close_ring};
use serde_json::json;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// GeoJSON text-sequence store (`.geojsonl`).
pub struct GeoJsonStore {
    path: PathBuf,
    crs: Option<String>,
    writer: Option<BufWriter<File>>,
}

impl GeoJsonStore {
    /// Create a store that will write to `path`.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            crs: None,
            writer: None,
        }
    }
}

impl PersistenceStore for GeoJsonStore {
    fn open_or_create(&mut self, crs: Option<&str>) -> Result<()> {
        let crs = crs.ok_or_else(|| Error::CrsUnavailable {
            path: self.path.clone(),
        })?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::StoreOpen {
                path: self.path.clone(),
                source: Box::new(e),
            })?;
        self.crs = Some(crs.to_string());
        self.writer = Some(BufWriter::new(file));
        Ok(())
    }

    fn append_feature(&mut self, result: &DetectionResult) -> Result<()> {
        let writer = self.writer.as_mut().ok_or_else(|| Error::Internal {
            message: "append_feature called on a closed store".to_string(),
        })?;

        let ring: Vec<[f64; 2]> = close_ring(result.geospatial_ring.clone())
            .into_iter()
            .map(|(lon, lat)| [lon, lat])
            .collect();

        let feature = json!({
            "type": "Feature",
            "crs": self.crs,
            "properties": {
                "confidence": result.confidence,
            },
            "geometry": {
                "type": "Polygon",
                "coordinates": [ring],
            },
        });

        serde_json::to_writer(&mut *writer, &feature).map_err(|e| Error::StoreAppend {
            path: self.path.clone(),
            source: Box::new(e),
        })?;
        writeln!(writer).map_err(|e| Error::StoreAppend {
            path: self.path.clone(),
            source: Box::new(e),
        })?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| Error::StoreAppend {
                path: self.path.clone(),
                source: Box::new(e),
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn result() -> DetectionResult {
        DetectionResult {
            confidence: 0.8765,
            geospatial_ring: vec![(10.0, 20.0), (11.0, 20.0), (11.0, 21.0)],
        }
    }

    #[test]
    fn test_requires_crs() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = GeoJsonStore::new(&dir.path().join("out.geojsonl"));
        assert!(matches!(
            store.open_or_create(None),
            Err(Error::CrsUnavailable { .. })
        ));
    }

    #[test]
    fn test_writes_closed_polygon_feature() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.geojsonl");
        let mut store = GeoJsonStore::new(&path);
        store.open_or_create(Some("EPSG:32633")).unwrap();
        store.append_feature(&result()).unwrap();
        store.close().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let line: serde_json::Value = serde_json::from_str(contents.trim()).unwrap();
        assert_eq!(line["type"], "Feature");
        assert_eq!(line["crs"], "EPSG:32633");
        assert_eq!(line["geometry"]["type"], "Polygon");

        let ring = line["geometry"]["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.len(), 4); // closed: first vertex repeated
        assert_eq!(ring[0], ring[3]);
    }

    #[test]
    fn test_appends_across_open_close_cycles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.geojsonl");
        let mut store = GeoJsonStore::new(&path);

        for _ in 0..2 {
            store.open_or_create(Some("EPSG:32633")).unwrap();
            store.append_feature(&result()).unwrap();
            store.close().unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn test_append_on_closed_store_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = GeoJsonStore::new(&dir.path().join("out.geojsonl"));
        assert!(store.append_feature(&result()).is_err());
    }
}
