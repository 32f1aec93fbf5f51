//! Multi-format persistence tests against real files.

use orthoscan::error::Error;
use orthoscan::output::{CsvStore, DetectionResult, FanoutStore, GeoJsonStore, PersistenceStore};
use tempfile::TempDir;

fn result(confidence: f32) -> DetectionResult {
    DetectionResult {
        confidence,
        geospatial_ring: vec![
            (500_000.0, 4_600_000.0),
            (500_010.0, 4_600_000.0),
            (500_010.0, 4_599_990.0),
        ],
    }
}

#[test]
fn fanout_writes_every_format_in_one_pass() {
    let dir = TempDir::new().unwrap();
    let geojson_path = dir.path().join("out.detections.geojsonl");
    let csv_path = dir.path().join("out.detections.csv");

    let mut store = FanoutStore::new(vec![
        Box::new(GeoJsonStore::new(&geojson_path)),
        Box::new(CsvStore::new(&csv_path)),
    ]);

    store.open_or_create(Some("EPSG:32633")).unwrap();
    store.append_feature(&result(0.91)).unwrap();
    store.append_feature(&result(0.42)).unwrap();
    store.close().unwrap();

    let geojson = std::fs::read_to_string(&geojson_path).unwrap();
    assert_eq!(geojson.lines().count(), 2);
    for line in geojson.lines() {
        let feature: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(feature["type"], "Feature");
        assert_eq!(feature["crs"], "EPSG:32633");
    }

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Confidence,Geometry");
    assert!(lines[1].starts_with("0.9100,"));
    assert!(lines[2].starts_with("0.4200,"));
}

#[test]
fn fanout_fails_when_any_member_cannot_open() {
    let dir = TempDir::new().unwrap();
    let mut store = FanoutStore::new(vec![
        Box::new(CsvStore::new(&dir.path().join("out.detections.csv"))),
        Box::new(GeoJsonStore::new(&dir.path().join("out.detections.geojsonl"))),
    ]);

    // The GeoJSON member refuses to create a layer without a CRS.
    assert!(matches!(
        store.open_or_create(None),
        Err(Error::CrsUnavailable { .. })
    ));
}

#[test]
fn fanout_appends_across_flush_cycles() {
    let dir = TempDir::new().unwrap();
    let geojson_path = dir.path().join("out.detections.geojsonl");
    let csv_path = dir.path().join("out.detections.csv");

    let mut store = FanoutStore::new(vec![
        Box::new(GeoJsonStore::new(&geojson_path)),
        Box::new(CsvStore::new(&csv_path)),
    ]);

    for cycle in 0..3 {
        store.open_or_create(Some("EPSG:25832")).unwrap();
        #[allow(clippy::cast_precision_loss)]
        store.append_feature(&result(0.5 + cycle as f32 * 0.1)).unwrap();
        store.close().unwrap();
    }

    let geojson = std::fs::read_to_string(&geojson_path).unwrap();
    assert_eq!(geojson.lines().count(), 3);

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    // Header once, then one row per cycle
    assert_eq!(csv.lines().count(), 4);
    assert_eq!(csv.lines().filter(|l| *l == "Confidence,Geometry").count(), 1);
}

#[test]
fn polygon_rows_are_closed_in_both_formats() {
    let dir = TempDir::new().unwrap();
    let geojson_path = dir.path().join("out.detections.geojsonl");
    let csv_path = dir.path().join("out.detections.csv");

    let mut store = FanoutStore::new(vec![
        Box::new(GeoJsonStore::new(&geojson_path)),
        Box::new(CsvStore::new(&csv_path)),
    ]);
    store.open_or_create(Some("EPSG:32633")).unwrap();
    store.append_feature(&result(0.75)).unwrap();
    store.close().unwrap();

    let geojson = std::fs::read_to_string(&geojson_path).unwrap();
    let feature: serde_json::Value = serde_json::from_str(geojson.trim()).unwrap();
    let ring = feature["geometry"]["coordinates"][0].as_array().unwrap();
    assert_eq!(ring.first(), ring.last());

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    // First and last WKT vertices match
    assert!(csv.contains("500000 4600000, ") && csv.contains(", 500000 4600000))"));
}
