//! Raster source backed by an image file with a world-file sidecar.
//!
//! Plain TIFF/PNG/JPEG rasters carry no georeferencing of their own;
//! the ESRI world-file convention supplies the affine transform in a
//! six-line text sidecar (`.tfw`, `.pgw`, `.jgw` or generic `.wld`),
//! and the CRS comes from a `.prj` (WKT) or `.epsg` (bare code)
//! sidecar.

use crate::error::{Error, Result};
use crate::geo::AffineTransform;
use crate::raster::{RasterExtent, RasterSource};
use ndarray::{Array3, s};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A georeferenced raster opened from an image file plus sidecars.
///
/// The `image` crate has no windowed decode, so the pixel data is held
/// decoded in memory; window reads are cheap slices. Larger-than-memory
/// rasters need a driver-backed [`RasterSource`] implementation instead.
pub struct WorldFileRaster {
    extent: RasterExtent,
    pixels: Array3<u8>,
}

impl WorldFileRaster {
    /// Open a raster image and resolve its world file and CRS sidecars.
    pub fn open(path: &Path) -> Result<Self> {
        let img = image::open(path).map_err(|e| Error::SourceOpen {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

        let bands = usize::from(img.color().channel_count());
        let rgb = img.into_rgb8();
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);
        let pixels = Array3::from_shape_vec((height, width, 3), rgb.into_raw())
            .map_err(|e| Error::SourceOpen {
                path: path.to_path_buf(),
                source: Box::new(e),
            })?;

        let world_path = find_world_file(path).ok_or_else(|| Error::WorldFileMissing {
            path: path.to_path_buf(),
        })?;
        let transform = parse_world_file(&world_path)?;

        let crs = read_crs_sidecar(path)?;
        if crs.is_none() {
            warn!("unable to determine CRS for {}", path.display());
        }

        info!(
            "opened raster {} ({width}x{height}, {bands} band(s), CRS: {})",
            path.display(),
            crs.as_deref().unwrap_or("unknown")
        );

        Ok(Self {
            extent: RasterExtent {
                width,
                height,
                bands,
                transform,
                crs,
            },
            pixels,
        })
    }
}

impl RasterSource for WorldFileRaster {
    fn extent(&self) -> &RasterExtent {
        &self.extent
    }

    fn read_window(&self, x: usize, y: usize, w: usize, h: usize) -> Result<Option<Array3<u8>>> {
        if w == 0 || h == 0 || x + w > self.extent.width || y + h > self.extent.height {
            return Ok(None);
        }
        Ok(Some(self.pixels.slice(s![y..y + h, x..x + w, ..]).to_owned()))
    }
}

/// Locate the world file for a raster path.
///
/// Tries the format-specific sidecar first (first and last letter of the
/// raster extension plus `w`, e.g. `.tif` -> `.tfw`), then generic `.wld`.
fn find_world_file(raster: &Path) -> Option<PathBuf> {
    let ext = raster.extension()?.to_str()?.to_ascii_lowercase();
    let mut candidates = Vec::new();

    let chars: Vec<char> = ext.chars().collect();
    if chars.len() >= 2 {
        let specific: String = [chars[0], chars[chars.len() - 1], 'w'].iter().collect();
        candidates.push(raster.with_extension(specific));
    }
    candidates.push(raster.with_extension(crate::constants::GENERIC_WORLD_FILE_EXTENSION));

    candidates.into_iter().find(|p| p.exists())
}

/// Parse a six-line ESRI world file into a corner-anchored geotransform.
///
/// World files give, in order: x pixel size, y rotation, x rotation,
/// y pixel size, then the geospatial coordinates of the *center* of the
/// top-left pixel. The corner-origin convention used everywhere else in
/// this crate requires shifting the origin back by half a pixel.
fn parse_world_file(path: &Path) -> Result<AffineTransform> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::WorldFileParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let values: Vec<f64> = contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| {
            l.parse::<f64>().map_err(|e| Error::WorldFileParse {
                path: path.to_path_buf(),
                reason: format!("invalid coefficient '{l}': {e}"),
            })
        })
        .collect::<Result<_>>()?;

    if values.len() != 6 {
        return Err(Error::WorldFileParse {
            path: path.to_path_buf(),
            reason: format!("expected 6 coefficients, found {}", values.len()),
        });
    }

    let [pixel_w, col_rotation, row_rotation, pixel_h, center_x, center_y] =
        [values[0], values[1], values[2], values[3], values[4], values[5]];

    Ok(AffineTransform {
        origin_x: center_x - 0.5 * pixel_w - 0.5 * row_rotation,
        pixel_w,
        row_rotation,
        origin_y: center_y - 0.5 * col_rotation - 0.5 * pixel_h,
        col_rotation,
        pixel_h,
    })
}

/// Resolve a CRS identifier from a `.prj` or `.epsg` sidecar.
///
/// A `.prj` holds WKT; the last `AUTHORITY["EPSG","nnnn"]` entry names
/// the overall CRS (earlier ones belong to nested datum/spheroid
/// definitions). A `.epsg` sidecar holds a bare numeric code.
fn read_crs_sidecar(raster: &Path) -> Result<Option<String>> {
    let prj = raster.with_extension("prj");
    if prj.exists() {
        let wkt = std::fs::read_to_string(&prj)?;
        #[allow(clippy::unwrap_used)] // pattern is a compile-time literal
        let re = Regex::new(r#"AUTHORITY\["EPSG",\s*"(\d+)"\]"#).unwrap();
        if let Some(code) = re.captures_iter(&wkt).last().and_then(|c| {
            c.get(1).map(|m| m.as_str().to_string())
        }) {
            return Ok(Some(format!("EPSG:{code}")));
        }
        warn!("no EPSG authority found in {}", prj.display());
    }

    let epsg = raster.with_extension("epsg");
    if epsg.exists() {
        let code = std::fs::read_to_string(&epsg)?;
        let code = code.trim();
        if !code.is_empty() && code.chars().all(|c| c.is_ascii_digit()) {
            return Ok(Some(format!("EPSG:{code}")));
        }
    }

    Ok(None)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 255) as u8, (y % 255) as u8, 7])
        });
        img.save(&path).unwrap();
        path
    }

    fn write_sidecar(path: &Path, ext: &str, contents: &str) {
        let mut f = std::fs::File::create(path.with_extension(ext)).unwrap();
        write!(f, "{contents}").unwrap();
    }

    const WORLD: &str = "0.5\n0.0\n0.0\n-0.5\n1000.25\n2000.25\n";

    #[test]
    fn test_open_with_world_file_and_prj() {
        let dir = tempfile::tempdir().unwrap();
        let raster = write_png(dir.path(), "ortho.png", 8, 6);
        write_sidecar(&raster, "pgw", WORLD);
        write_sidecar(
            &raster,
            "prj",
            r#"PROJCS["WGS 84 / UTM 33N",GEOGCS["WGS 84",DATUM["WGS_1984",
            SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],
            AUTHORITY["EPSG","6326"]],AUTHORITY["EPSG","4326"]],
            AUTHORITY["EPSG","32633"]]"#,
        );

        let source = WorldFileRaster::open(&raster).unwrap();
        let extent = source.extent();
        assert_eq!((extent.width, extent.height), (8, 6));
        assert_eq!(extent.bands, 3);
        assert_eq!(extent.crs.as_deref(), Some("EPSG:32633"));

        // Center-of-pixel 1000.25 with 0.5 pixels puts the corner at 1000.0
        assert_eq!(extent.transform.origin_x, 1000.0);
        assert_eq!(extent.transform.origin_y, 2000.5);
        assert_eq!(extent.transform.pixel_w, 0.5);
        assert_eq!(extent.transform.pixel_h, -0.5);
    }

    #[test]
    fn test_open_with_epsg_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let raster = write_png(dir.path(), "ortho.png", 4, 4);
        write_sidecar(&raster, "pgw", WORLD);
        write_sidecar(&raster, "epsg", "25832\n");

        let source = WorldFileRaster::open(&raster).unwrap();
        assert_eq!(source.extent().crs.as_deref(), Some("EPSG:25832"));
    }

    #[test]
    fn test_open_without_crs_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let raster = write_png(dir.path(), "ortho.png", 4, 4);
        write_sidecar(&raster, "pgw", WORLD);

        let source = WorldFileRaster::open(&raster).unwrap();
        assert!(source.extent().crs.is_none());
    }

    #[test]
    fn test_missing_world_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let raster = write_png(dir.path(), "ortho.png", 4, 4);
        assert!(matches!(
            WorldFileRaster::open(&raster),
            Err(Error::WorldFileMissing { .. })
        ));
    }

    #[test]
    fn test_generic_wld_sidecar_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let raster = write_png(dir.path(), "ortho.png", 4, 4);
        write_sidecar(&raster, "wld", WORLD);
        assert!(WorldFileRaster::open(&raster).is_ok());
    }

    #[test]
    fn test_malformed_world_file() {
        let dir = tempfile::tempdir().unwrap();
        let raster = write_png(dir.path(), "ortho.png", 4, 4);
        write_sidecar(&raster, "pgw", "0.5\nnot-a-number\n");
        assert!(matches!(
            WorldFileRaster::open(&raster),
            Err(Error::WorldFileParse { .. })
        ));
    }

    #[test]
    fn test_read_window_in_and_out_of_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let raster = write_png(dir.path(), "ortho.png", 8, 6);
        write_sidecar(&raster, "pgw", WORLD);

        let source = WorldFileRaster::open(&raster).unwrap();
        let window = source.read_window(2, 1, 4, 3).unwrap().unwrap();
        assert_eq!(window.shape(), &[3, 4, 3]);
        assert_eq!(window[[0, 0, 0]], 2); // x % 255 at x=2
        assert_eq!(window[[0, 0, 1]], 1); // y % 255 at y=1

        assert!(source.read_window(6, 0, 4, 4).unwrap().is_none());
        assert!(source.read_window(0, 0, 0, 4).unwrap().is_none());
    }
}
