//! Round-trip and reference tests for the Swiss grid transformations.

use projection::{SwissGrid, Transformer};
use wind_common::CrsCode;

// ============================================================================
// Reference points
// ============================================================================

#[test]
fn test_bern_origin_lv95() {
    // The old Bern observatory is the LV95 false origin (2 600 000 / 1 200 000)
    let (e, n) = SwissGrid::lv95()
        .from_geographic(7.43863, 46.95108)
        .unwrap();
    assert!((e - 2_600_000.0).abs() < 5.0, "easting {}", e);
    assert!((n - 1_200_000.0).abs() < 5.0, "northing {}", n);
}

#[test]
fn test_inverse_reference_point() {
    let (lon, lat) = SwissGrid::lv95()
        .to_geographic(2_700_000.0, 1_100_000.0)
        .unwrap();
    let expected_lon = 8.0 + 43.0 / 60.0 + 49.80 / 3600.0;
    let expected_lat = 46.0 + 2.0 / 60.0 + 38.86 / 3600.0;
    // ~1e-4 degrees is ~10 m, far coarser than the formula error
    assert!((lon - expected_lon).abs() < 1e-4, "lon {}", lon);
    assert!((lat - expected_lat).abs() < 1e-4, "lat {}", lat);
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn test_roundtrip_across_switzerland() {
    let to_lv95 = Transformer::new(CrsCode::Epsg4326, CrsCode::Epsg2056);
    let to_wgs84 = Transformer::new(CrsCode::Epsg2056, CrsCode::Epsg4326);

    for &(lon, lat) in &[(6.1, 46.2), (7.44, 46.95), (9.5, 47.4), (10.4, 46.6)] {
        let (e, n) = to_lv95.transform(lon, lat).unwrap();
        let (lon2, lat2) = to_wgs84.transform(e, n).unwrap();
        assert!((lon - lon2).abs() < 1e-4, "lon {} vs {}", lon, lon2);
        assert!((lat - lat2).abs() < 1e-4, "lat {} vs {}", lat, lat2);
    }
}

#[test]
fn test_mercator_to_swiss() {
    let t = Transformer::new(CrsCode::Epsg3857, CrsCode::Epsg2056);
    let (x, y) = projection::WebMercator.from_geographic(7.43863, 46.95108).unwrap();
    let (e, n) = t.transform(x, y).unwrap();
    assert!((e - 2_600_000.0).abs() < 5.0);
    assert!((n - 1_200_000.0).abs() < 5.0);
}
