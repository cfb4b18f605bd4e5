//! Boundary fixtures in the formats region outlines are downloaded in:
//! zip archives, shapefiles and GeoPackages.

use std::io::Write;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use shapefile::dbase::{self, FieldName, FieldValue, Record};
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::paths::scratch_path;

/// ESRI WKT of WGS84 lon/lat, as shipped in GADM `.prj` files.
pub const WGS84_PRJ: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

/// Writes a zip archive at `dir/name` holding `members` (path, bytes).
pub fn write_zip_fixture(dir: &Path, name: &str, members: &[(&str, &[u8])]) -> PathBuf {
    let path = scratch_path(dir, name);
    let file = std::fs::File::create(&path).expect("Failed to create archive");
    let mut zip = ZipWriter::new(file);
    for (member, bytes) in members {
        zip.start_file(*member, FileOptions::default())
            .expect("Failed to start archive member");
        zip.write_all(bytes).expect("Failed to write archive member");
    }
    zip.finish().expect("Failed to finish archive");
    path
}

/// Writes `dir/<stem>.shp` (with `.shx`, `.dbf` and an optional `.prj`)
/// holding one rectangle whose `NAME_0` attribute is `region`. Returns the
/// `.shp` path.
pub fn write_rectangle_shapefile(
    dir: &Path,
    stem: &str,
    region: &str,
    [min_x, min_y, max_x, max_y]: [f64; 4],
    prj: Option<&str>,
) -> PathBuf {
    let shp_path = scratch_path(dir, &format!("{}.shp", stem));
    let table = dbase::TableWriterBuilder::new().add_character_field(
        FieldName::try_from("NAME_0").expect("Invalid field name"),
        50,
    );
    let mut writer = shapefile::Writer::from_path(&shp_path, table).expect("Failed to create shapefile");

    // Clockwise, as shapefile outer rings are
    let outer = vec![
        shapefile::Point::new(min_x, min_y),
        shapefile::Point::new(min_x, max_y),
        shapefile::Point::new(max_x, max_y),
        shapefile::Point::new(max_x, min_y),
        shapefile::Point::new(min_x, min_y),
    ];
    let polygon = shapefile::Polygon::new(shapefile::PolygonRing::Outer(outer));
    let mut record = Record::default();
    record.insert("NAME_0".to_string(), FieldValue::Character(Some(region.to_string())));
    writer
        .write_shape_and_record(&polygon, &record)
        .expect("Failed to write shape");
    drop(writer);

    if let Some(wkt) = prj {
        std::fs::write(shp_path.with_extension("prj"), wkt).expect("Failed to write .prj");
    }
    shp_path
}

/// The files of a shapefile written by [`write_rectangle_shapefile`], as
/// archive members named after their file names.
pub fn shapefile_members(shp_path: &Path) -> Vec<(String, Vec<u8>)> {
    ["shp", "shx", "dbf", "prj"]
        .iter()
        .map(|ext| shp_path.with_extension(ext))
        .filter(|p| p.is_file())
        .map(|p| {
            let name = p
                .file_name()
                .and_then(|n| n.to_str())
                .expect("Fixture file name")
                .to_string();
            (name, std::fs::read(&p).expect("Failed to read shapefile part"))
        })
        .collect()
}

/// GeoPackage geometry blob: header without envelope, then little-endian
/// WKB of a single polygon.
pub fn gpkg_rectangle_blob(srs_id: i32, [min_x, min_y, max_x, max_y]: [f64; 4]) -> Vec<u8> {
    let ring = [
        (min_x, min_y),
        (max_x, min_y),
        (max_x, max_y),
        (min_x, max_y),
        (min_x, min_y),
    ];
    let mut blob = vec![b'G', b'P', 0, 0b0000_0001];
    blob.extend(srs_id.to_le_bytes());
    blob.push(1);
    blob.extend(3u32.to_le_bytes());
    blob.extend(1u32.to_le_bytes());
    blob.extend((ring.len() as u32).to_le_bytes());
    for (x, y) in ring {
        blob.extend(x.to_le_bytes());
        blob.extend(y.to_le_bytes());
    }
    blob
}

/// Writes a GeoPackage at `dir/name` with one feature layer per entry of
/// `layers` (table, region name, rectangle), in that order, all in EPSG
/// code `epsg`.
pub fn write_geopackage_fixture(
    dir: &Path,
    name: &str,
    layers: &[(&str, &str, [f64; 4])],
    epsg: i32,
) -> PathBuf {
    let path = scratch_path(dir, name);
    let conn = Connection::open(&path).expect("Failed to create GeoPackage");
    conn.execute_batch(
        "CREATE TABLE gpkg_spatial_ref_sys (
             srs_name TEXT NOT NULL, srs_id INTEGER PRIMARY KEY,
             organization TEXT NOT NULL, organization_coordsys_id INTEGER NOT NULL,
             definition TEXT NOT NULL, description TEXT);
         CREATE TABLE gpkg_contents (
             table_name TEXT PRIMARY KEY, data_type TEXT NOT NULL,
             identifier TEXT, srs_id INTEGER);
         CREATE TABLE gpkg_geometry_columns (
             table_name TEXT NOT NULL, column_name TEXT NOT NULL,
             geometry_type_name TEXT NOT NULL, srs_id INTEGER NOT NULL,
             z TINYINT NOT NULL, m TINYINT NOT NULL);",
    )
    .expect("Failed to create GeoPackage tables");
    conn.execute(
        "INSERT INTO gpkg_spatial_ref_sys VALUES (?1, ?2, 'EPSG', ?2, 'undefined', NULL)",
        params![format!("EPSG:{}", epsg), epsg],
    )
    .expect("Failed to register SRS");

    for (table, region, rect) in layers {
        conn.execute_batch(&format!(
            "CREATE TABLE \"{}\" (fid INTEGER PRIMARY KEY, geom BLOB, NAME_0 TEXT);",
            table
        ))
        .expect("Failed to create layer");
        conn.execute(
            "INSERT INTO gpkg_contents VALUES (?1, 'features', ?1, ?2)",
            params![table, epsg],
        )
        .expect("Failed to register layer");
        conn.execute(
            "INSERT INTO gpkg_geometry_columns VALUES (?1, 'geom', 'MULTIPOLYGON', ?2, 0, 0)",
            params![table, epsg],
        )
        .expect("Failed to register geometry column");
        conn.execute(
            &format!("INSERT INTO \"{}\" (geom, NAME_0) VALUES (?1, ?2)", table),
            params![gpkg_rectangle_blob(epsg, *rect), region],
        )
        .expect("Failed to insert feature");
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::temp_test_dir;

    #[test]
    fn test_zip_fixture_lists_members() {
        let dir = temp_test_dir();
        let path = write_zip_fixture(dir.path(), "a.zip", &[("x.txt", &b"one"[..]), ("y/z.txt", &b"two"[..])]);
        let archive = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(names, vec!["x.txt", "y/z.txt"]);
    }

    #[test]
    fn test_shapefile_fixture_parts() {
        let dir = temp_test_dir();
        let shp = write_rectangle_shapefile(dir.path(), "region", "CH", [0.0, 0.0, 1.0, 1.0], Some(WGS84_PRJ));
        let names: Vec<String> = shapefile_members(&shp).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["region.shp", "region.shx", "region.dbf", "region.prj"]);
    }
}
