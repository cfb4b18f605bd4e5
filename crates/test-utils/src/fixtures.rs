//! GeoJSON fixtures for grid-cell and boundary tests.

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, Value};

/// Closed rectangle ring in GeoJSON position order.
pub fn rectangle_ring(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Value {
    json!([[
        [min_x, min_y],
        [max_x, min_y],
        [max_x, max_y],
        [min_x, max_y],
        [min_x, min_y]
    ]])
}

fn named_crs(crs: Option<&str>) -> Value {
    match crs {
        Some(name) => json!({"type": "name", "properties": {"name": name}}),
        None => Value::Null,
    }
}

/// A FeatureCollection with one square cell per `(x, y)` label pair.
///
/// Each cell is centred on its labels with half-width `half`; the labels
/// are stored under `x_name` / `y_name`.
pub fn square_cells_geojson(
    x: &[f64],
    y: &[f64],
    x_name: &str,
    y_name: &str,
    half: f64,
    crs: Option<&str>,
) -> String {
    let features: Vec<Value> = y
        .iter()
        .flat_map(|&cy| x.iter().map(move |&cx| (cx, cy)))
        .map(|(cx, cy)| {
            json!({
                "type": "Feature",
                "properties": {x_name: cx, y_name: cy},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": rectangle_ring(cx - half, cy - half, cx + half, cy + half)
                }
            })
        })
        .collect();

    let mut doc = json!({"type": "FeatureCollection", "features": features});
    if crs.is_some() {
        doc["crs"] = named_crs(crs);
    }
    doc.to_string()
}

/// A single-feature FeatureCollection holding a rectangular region.
pub fn rectangle_boundary_geojson(
    name: &str,
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
    crs: Option<&str>,
) -> String {
    let mut doc = json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"name": name},
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": [rectangle_ring(min_x, min_y, max_x, max_y)]
            }
        }]
    });
    if crs.is_some() {
        doc["crs"] = named_crs(crs);
    }
    doc.to_string()
}

/// Writes `contents` to `dir/name`.
pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = crate::paths::scratch_path(dir, name);
    std::fs::write(&path, contents).expect("Failed to write fixture");
    path
}

/// Writes `contents` gzip-compressed to `dir/name`.
pub fn write_gzip_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = crate::paths::scratch_path(dir, name);
    let file = std::fs::File::create(&path).expect("Failed to create fixture");
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder
        .write_all(contents.as_bytes())
        .expect("Failed to compress fixture");
    encoder.finish().expect("Failed to finish gzip stream");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_cells_feature_count() {
        let text = square_cells_geojson(&[0.0, 1.0, 2.0], &[0.0, 1.0], "lon", "lat", 0.5, None);
        let doc: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["features"].as_array().unwrap().len(), 6);
        assert_eq!(doc["features"][4]["properties"]["lon"], 1.0);
        assert!(doc.get("crs").is_none());
    }

    #[test]
    fn test_boundary_carries_crs() {
        let text = rectangle_boundary_geojson("CH", 0.0, 0.0, 1.0, 1.0, Some("EPSG:2056"));
        let doc: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["crs"]["properties"]["name"], "EPSG:2056");
    }
}
