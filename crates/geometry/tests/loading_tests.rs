//! File-backed tests for grid-cell and boundary loading.

use geometry::{load_boundary, load_grid_cells, GeometryError, Predicate};
use std::path::{Path, PathBuf};

use test_utils::{
    rectangle_boundary_geojson, shapefile_members, square_cells_geojson, temp_test_dir,
    write_fixture, write_geopackage_fixture, write_gzip_fixture, write_rectangle_shapefile,
    write_zip_fixture, WGS84_PRJ,
};
use wind_common::{CellField, CrsCode, DatasetConfig};

fn newa_config() -> DatasetConfig {
    DatasetConfig::new("west_east", "south_north", "NEWA")
}

// ============================================================================
// Grid cells
// ============================================================================

#[test]
fn test_load_cells_reads_coordinate_properties() {
    let dir = temp_test_dir();
    let text = square_cells_geojson(&[6.0, 7.0, 8.0], &[46.0, 47.0], "west_east", "south_north", 0.5, None);
    let path = write_fixture(dir.path(), "newa.geojson", &text);

    let table = load_grid_cells(&path, &newa_config(), CrsCode::Epsg4326).unwrap();
    assert_eq!(table.len(), 6);
    assert_eq!(table.x_name, "west_east");
    assert_eq!(table.cells()[4].x, 7.0);
    assert_eq!(table.cells()[4].y, 47.0);
}

#[test]
fn test_load_cells_gzip() {
    let dir = temp_test_dir();
    let text = square_cells_geojson(&[6.0, 7.0], &[46.0], "west_east", "south_north", 0.5, None);
    let path = write_gzip_fixture(dir.path(), "newa.geojson.gz", &text);

    let table = load_grid_cells(&path, &newa_config(), CrsCode::Epsg4326).unwrap();
    assert_eq!(table.len(), 2);
}

#[test]
fn test_load_cells_missing_property() {
    let dir = temp_test_dir();
    let text = square_cells_geojson(&[6.0], &[46.0], "lon", "lat", 0.5, None);
    let path = write_fixture(dir.path(), "cells.geojson", &text);

    let err = load_grid_cells(&path, &newa_config(), CrsCode::Epsg4326).unwrap_err();
    assert!(matches!(err, GeometryError::MissingProperty { index: 0, .. }));
}

#[test]
fn test_load_cells_reprojects_to_plot_crs() {
    let dir = temp_test_dir();
    let text = square_cells_geojson(&[8.0], &[47.0], "west_east", "south_north", 0.1, None);
    let path = write_fixture(dir.path(), "cells.geojson", &text);

    let table = load_grid_cells(&path, &newa_config(), CrsCode::Epsg2056).unwrap();
    let bounds = table.total_bounds().unwrap();
    // Central Switzerland in LV95
    assert!(bounds.min_x > 2_600_000.0 && bounds.max_x < 2_700_000.0, "{:?}", bounds);
    assert!(bounds.min_y > 1_150_000.0 && bounds.max_y < 1_300_000.0, "{:?}", bounds);
    // Labels stay in the dataset's own coordinates
    assert_eq!(table.cells()[0].x, 8.0);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = load_grid_cells("/nonexistent/cells.geojson", &newa_config(), CrsCode::Epsg4326)
        .unwrap_err();
    assert!(matches!(err, GeometryError::Io { .. }));
}

// ============================================================================
// Boundary
// ============================================================================

#[test]
fn test_load_boundary_takes_first_feature() {
    let dir = temp_test_dir();
    let text = rectangle_boundary_geojson("Switzerland", 6.0, 46.0, 10.0, 48.0, Some("EPSG:4326"));
    let path = write_fixture(dir.path(), "ch.geojson", &text);

    let boundary = load_boundary(&path, CrsCode::Epsg4326).unwrap();
    assert_eq!(boundary.name, "Switzerland");
    let bounds = boundary.total_bounds().unwrap();
    assert_eq!((bounds.min_x, bounds.max_y), (6.0, 48.0));
}

#[test]
fn test_empty_boundary_is_error() {
    let dir = temp_test_dir();
    let path = write_fixture(
        dir.path(),
        "empty.geojson",
        r#"{"type": "FeatureCollection", "features": []}"#,
    );
    let err = load_boundary(&path, CrsCode::Epsg4326).unwrap_err();
    assert!(matches!(err, GeometryError::NoGeometry(_)));
}

// ============================================================================
// Zipped and non-GeoJSON boundaries
// ============================================================================

const CH_BOX: [f64; 4] = [6.0, 45.8, 10.5, 47.8];

/// A GADM-style shapefile download: `gadm36_CHE_0` plus a finer level.
fn zipped_gadm_shapefile(dir: &Path) -> PathBuf {
    let level0 = write_rectangle_shapefile(dir, "shp/gadm36_CHE_0", "Switzerland", CH_BOX, Some(WGS84_PRJ));
    let level1 = write_rectangle_shapefile(dir, "shp/gadm36_CHE_1", "Bern", [7.0, 46.3, 8.4, 47.3], Some(WGS84_PRJ));

    let mut parts = shapefile_members(&level1);
    parts.extend(shapefile_members(&level0));
    parts.push(("license.txt".to_string(), b"GADM".to_vec()));
    let members: Vec<(&str, &[u8])> = parts.iter().map(|(n, b)| (n.as_str(), b.as_slice())).collect();
    write_zip_fixture(dir, "gadm36_CHE_shp.zip", &members)
}

fn assert_swiss_box(path: &Path, expected_name: &str) {
    let boundary = load_boundary(path, CrsCode::Epsg4326).unwrap();
    assert_eq!(boundary.name, expected_name);
    let bounds = boundary.total_bounds().unwrap();
    assert_eq!((bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y), (6.0, 45.8, 10.5, 47.8));
}

#[test]
fn test_boundary_from_zipped_shapefile_picks_level_zero() {
    let dir = temp_test_dir();
    let archive = zipped_gadm_shapefile(dir.path());
    assert_swiss_box(&archive, "Switzerland");
}

#[test]
fn test_boundary_from_named_archive_member() {
    let dir = temp_test_dir();
    let archive = zipped_gadm_shapefile(dir.path());

    let member = PathBuf::from(format!("{}!gadm36_CHE_1.shp", archive.display()));
    let boundary = load_boundary(&member, CrsCode::Epsg4326).unwrap();
    assert_eq!(boundary.name, "Bern");

    let scheme = PathBuf::from(format!("zip://{}!gadm36_CHE_0.shp", archive.display()));
    assert_swiss_box(&scheme, "Switzerland");
}

#[test]
fn test_boundary_reprojected_from_zipped_shapefile() {
    let dir = temp_test_dir();
    let archive = zipped_gadm_shapefile(dir.path());

    let boundary = load_boundary(&archive, CrsCode::Epsg2056).unwrap();
    let bounds = boundary.total_bounds().unwrap();
    assert!(bounds.min_x > 2_400_000.0 && bounds.max_x < 2_900_000.0, "{:?}", bounds);
    assert!(bounds.min_y > 1_000_000.0 && bounds.max_y < 1_350_000.0, "{:?}", bounds);
}

#[test]
fn test_boundary_from_plain_shapefile() {
    let dir = temp_test_dir();
    let shp = write_rectangle_shapefile(dir.path(), "ch", "Switzerland", CH_BOX, Some(WGS84_PRJ));
    assert_swiss_box(&shp, "Switzerland");
}

#[test]
fn test_boundary_from_zipped_geopackage() {
    let dir = temp_test_dir();
    let gpkg = write_geopackage_fixture(
        dir.path(),
        "gpkg/gadm36_CHE.gpkg",
        &[
            ("gadm36_CHE_0", "Switzerland", CH_BOX),
            ("gadm36_CHE_1", "Bern", [7.0, 46.3, 8.4, 47.3]),
        ],
        4326,
    );
    let bytes = std::fs::read(&gpkg).unwrap();
    let archive = write_zip_fixture(dir.path(), "gadm36_CHE_gpkg.zip", &[("gadm36_CHE.gpkg", bytes.as_slice())]);

    // The layout of the GADM download: layer 0 of the named member
    let member = PathBuf::from(format!("zip://{}!gadm36_CHE.gpkg", archive.display()));
    assert_swiss_box(&member, "Switzerland");
    assert_swiss_box(&gpkg, "Switzerland");
}

#[test]
fn test_boundary_from_zipped_geojson() {
    let dir = temp_test_dir();
    let text = rectangle_boundary_geojson("Switzerland", 6.0, 45.8, 10.5, 47.8, None);
    let archive = write_zip_fixture(dir.path(), "ch.zip", &[("ch.geojson", text.as_bytes())]);
    assert_swiss_box(&archive, "Switzerland");
}

#[test]
fn test_archive_member_errors() {
    let dir = temp_test_dir();
    let archive = zipped_gadm_shapefile(dir.path());

    let absent = PathBuf::from(format!("{}!gadm36_CHE_9.shp", archive.display()));
    let err = load_boundary(&absent, CrsCode::Epsg4326).unwrap_err();
    assert!(matches!(err, GeometryError::MissingMember { .. }), "{}", err);

    let unknown = PathBuf::from(format!("{}!license.txt", archive.display()));
    let err = load_boundary(&unknown, CrsCode::Epsg4326).unwrap_err();
    assert!(matches!(err, GeometryError::UnsupportedFormat(_)), "{}", err);

    let no_vectors = write_zip_fixture(dir.path(), "docs.zip", &[("readme.txt", &b"nothing"[..])]);
    let err = load_boundary(&no_vectors, CrsCode::Epsg4326).unwrap_err();
    assert!(matches!(err, GeometryError::NoGeometry(_)), "{}", err);

    let not_zip = write_fixture(dir.path(), "broken.zip", "not an archive");
    let err = load_boundary(&not_zip, CrsCode::Epsg4326).unwrap_err();
    assert!(matches!(err, GeometryError::Archive { .. }), "{}", err);
}

#[test]
fn test_grid_cells_from_zipped_geojson() {
    let dir = temp_test_dir();
    let text = square_cells_geojson(&[6.0, 7.0], &[46.0], "west_east", "south_north", 0.5, None);
    let archive = write_zip_fixture(dir.path(), "newa-polys.zip", &[("polys.geojson", text.as_bytes())]);

    let table = load_grid_cells(&archive, &newa_config(), CrsCode::Epsg4326).unwrap();
    assert_eq!(table.len(), 2);
}

// ============================================================================
// Cells against the boundary
// ============================================================================

#[test]
fn test_masks_and_columns_end_to_end() {
    let dir = temp_test_dir();
    let x = [0.0, 1.0, 2.0, 3.0];
    let y = [0.0, 1.0];
    let cells = write_fixture(
        dir.path(),
        "cells.geojson",
        &square_cells_geojson(&x, &y, "west_east", "south_north", 0.5, None),
    );
    let region = write_fixture(
        dir.path(),
        "region.geojson",
        &rectangle_boundary_geojson("region", -0.5, -0.5, 1.8, 1.5, None),
    );

    let mut table = load_grid_cells(&cells, &newa_config(), CrsCode::Epsg4326).unwrap();
    let boundary = load_boundary(&region, CrsCode::Epsg4326).unwrap();
    let prepared = boundary.prepare();

    let intersects = table.predicate_mask(&prepared, Predicate::Intersects);
    let within = table.predicate_mask(&prepared, Predicate::Within);
    assert_eq!(intersects, vec![true, true, true, false, true, true, true, false]);
    assert_eq!(within, vec![true, true, false, false, true, true, false, false]);

    let field = CellField {
        x: x.to_vec(),
        y: y.to_vec(),
        values: (0..8).map(f64::from).collect(),
    };
    assert_eq!(table.assign_field("ave_ws", &field), 8);
    assert_eq!(table.column("ave_ws").unwrap()[5], 5.0);
}
