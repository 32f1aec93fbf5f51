//! CSV persistence store with WKT polygon geometry.

use crate::constants::confidence::DECIMAL_PLACES;
use crate::error::{Error, Result};
use crate::output::{DetectionResult, PersistenceStore, close_ring};
use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// CSV store: one row per detection with a confidence column and a
/// `POLYGON` WKT column. Tolerates a missing CRS (the geometry column
/// is still meaningful to anyone who knows the source raster).
pub struct CsvStore {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl CsvStore {
    /// Create a store that will write to `path`.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            writer: None,
        }
    }
}

impl PersistenceStore for CsvStore {
    fn open_or_create(&mut self, _crs: Option<&str>) -> Result<()> {
        let needs_header = std::fs::metadata(&self.path).map_or(true, |m| m.len() == 0);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::StoreOpen {
                path: self.path.clone(),
                source: Box::new(e),
            })?;
        let mut writer = BufWriter::new(file);
        if needs_header {
            writeln!(writer, "Confidence,Geometry").map_err(|e| Error::StoreOpen {
                path: self.path.clone(),
                source: Box::new(e),
            })?;
        }
        self.writer = Some(writer);
        Ok(())
    }

    fn append_feature(&mut self, result: &DetectionResult) -> Result<()> {
        let writer = self.writer.as_mut().ok_or_else(|| Error::Internal {
            message: "append_feature called on a closed store".to_string(),
        })?;

        let wkt = polygon_wkt(&close_ring(result.geospatial_ring.clone()));
        writeln!(
            writer,
            "{:.decimal$},{}",
            result.confidence,
            escape_csv(&wkt),
            decimal = DECIMAL_PLACES,
        )
        .map_err(|e| Error::StoreAppend {
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

/// Format a closed ring as WKT `POLYGON ((x y, x y, ...))`.
fn polygon_wkt(ring: &[(f64, f64)]) -> String {
    let mut wkt = String::from("POLYGON ((");
    for (i, (lon, lat)) in ring.iter().enumerate() {
        if i > 0 {
            wkt.push_str(", ");
        }
        let _ = write!(wkt, "{lon} {lat}");
    }
    wkt.push_str("))");
    wkt
}

/// Escape a value for CSV output.
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
