//! GeoPackage reading.
//!
//! Reads the first feature layer listed in `gpkg_contents`. Geometries are
//! stored as GeoPackage binary blobs: a small `GP` header followed by
//! standard WKB.

use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use serde_json::{Map, Number, Value};
use tracing::debug;
use wind_common::CrsCode;

use crate::error::{GeometryError, GeometryResult};
use crate::geojson::{AreaFeature, FeatureSource};
use crate::polygon::{MultiPolygon, Polygon, Ring};

/// Read the first feature layer of a GeoPackage file.
pub fn read_geopackage(path: &Path, origin: &str) -> GeometryResult<FeatureSource> {
    let sql_error = |source| GeometryError::GeoPackage {
        path: origin.to_string(),
        source,
    };

    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(sql_error)?;

    let table: String = conn
        .query_row(
            "SELECT table_name FROM gpkg_contents WHERE data_type = 'features' ORDER BY rowid LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(sql_error)?
        .ok_or_else(|| GeometryError::NoGeometry(origin.to_string()))?;

    let (column, srs_id): (String, i64) = conn
        .query_row(
            "SELECT column_name, srs_id FROM gpkg_geometry_columns WHERE table_name = ?1",
            [&table],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(sql_error)?;

    let crs = layer_crs(&conn, srs_id, origin)?;
    debug!(source = origin, layer = %table, column = %column, crs = %crs, "Reading GeoPackage layer");

    let mut stmt = conn
        .prepare(&format!("SELECT * FROM \"{}\"", table.replace('"', "\"\"")))
        .map_err(sql_error)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
    let mut rows = stmt.query([]).map_err(sql_error)?;

    let mut features = Vec::new();
    let mut index = 0usize;
    let mut skipped = 0usize;
    while let Some(row) = rows.next().map_err(sql_error)? {
        let mut geometry = None;
        let mut properties = Map::new();
        for (i, name) in names.iter().enumerate() {
            let value = row.get_ref(i).map_err(sql_error)?;
            if name.eq_ignore_ascii_case(&column) {
                if let ValueRef::Blob(blob) = value {
                    geometry = parse_gpkg_geometry(blob).map_err(|message| GeometryError::InvalidGeometry {
                        path: origin.to_string(),
                        message: format!("feature {}: {}", index, message),
                    })?;
                }
            } else {
                properties.insert(name.clone(), sql_to_json(value));
            }
        }

        match geometry {
            Some(geometry) => features.push(AreaFeature {
                index,
                geometry,
                properties,
            }),
            None => skipped += 1,
        }
        index += 1;
    }

    if skipped > 0 {
        debug!(source = origin, skipped, "Skipped features without areal geometry");
    }
    Ok(FeatureSource { crs, features })
}

fn layer_crs(conn: &Connection, srs_id: i64, origin: &str) -> GeometryResult<CrsCode> {
    let definition: Option<(String, i64)> = conn
        .query_row(
            "SELECT organization, organization_coordsys_id FROM gpkg_spatial_ref_sys WHERE srs_id = ?1",
            [srs_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(|source| GeometryError::GeoPackage {
            path: origin.to_string(),
            source,
        })?;

    let name = match definition {
        Some((organization, code)) => format!("{}:{}", organization, code),
        None => format!("srs_id {}", srs_id),
    };
    CrsCode::parse(&name).map_err(|_| GeometryError::UnsupportedCrs {
        path: origin.to_string(),
        name,
    })
}

fn sql_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => Value::Null,
        ValueRef::Integer(v) => Value::from(v),
        ValueRef::Real(v) => Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Areal content of a GeoPackage geometry blob; `None` for empty or
/// non-areal geometries.
pub fn parse_gpkg_geometry(blob: &[u8]) -> Result<Option<MultiPolygon>, String> {
    if blob.len() < 8 || &blob[..2] != b"GP" {
        return Err("missing GeoPackage header".to_string());
    }
    let flags = blob[3];
    if flags & 0x10 != 0 {
        return Ok(None);
    }
    let envelope = match (flags >> 1) & 0x07 {
        0 => 0,
        1 => 32,
        2 | 3 => 48,
        4 => 64,
        other => return Err(format!("invalid envelope code {}", other)),
    };

    let mut reader = WkbReader {
        buf: blob,
        pos: 8 + envelope,
    };
    let mut polygons = Vec::new();
    reader.geometry(&mut polygons)?;
    Ok((!polygons.is_empty()).then(|| MultiPolygon::new(polygons)))
}

/// Cursor over well-known binary. Every nested geometry carries its own
/// byte order.
struct WkbReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl WkbReader<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], String> {
        let bytes = self
            .buf
            .get(self.pos..self.pos + N)
            .ok_or_else(|| format!("WKB truncated at byte {}", self.pos))?;
        self.pos += N;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn u32(&mut self, little: bool) -> Result<u32, String> {
        let b = self.take::<4>()?;
        Ok(if little { u32::from_le_bytes(b) } else { u32::from_be_bytes(b) })
    }

    fn f64(&mut self, little: bool) -> Result<f64, String> {
        let b = self.take::<8>()?;
        Ok(if little { f64::from_le_bytes(b) } else { f64::from_be_bytes(b) })
    }

    fn ring(&mut self, little: bool, dims: usize) -> Result<Ring, String> {
        let n = self.u32(little)? as usize;
        let mut points = Vec::with_capacity(n.min(1 << 20));
        for _ in 0..n {
            let x = self.f64(little)?;
            let y = self.f64(little)?;
            for _ in 2..dims {
                self.f64(little)?;
            }
            points.push((x, y));
        }
        Ok(Ring::new(points))
    }

    fn geometry(&mut self, out: &mut Vec<Polygon>) -> Result<(), String> {
        let little = match self.take::<1>()?[0] {
            0 => false,
            1 => true,
            other => return Err(format!("invalid WKB byte order {}", other)),
        };
        let code = self.u32(little)?;
        // ISO codes add 1000/2000/3000 for Z/M/ZM, EWKB sets high bits
        let ewkb_dims = usize::from(code & 0x8000_0000 != 0) + usize::from(code & 0x4000_0000 != 0);
        let iso = (code & 0x0FFF_FFFF) as usize;
        let dims = 2 + ewkb_dims + match iso / 1000 {
            0 => 0,
            1 | 2 => 1,
            _ => 2,
        };
        if code & 0x2000_0000 != 0 {
            // EWKB embedded SRID
            self.u32(little)?;
        }

        match iso % 1000 {
            1 => {
                for _ in 0..dims {
                    self.f64(little)?;
                }
            }
            2 => {
                self.ring(little, dims)?;
            }
            3 => {
                let n = self.u32(little)?;
                let mut rings = Vec::new();
                for _ in 0..n {
                    rings.push(self.ring(little, dims)?);
                }
                let mut rings = rings.into_iter();
                if let Some(exterior) = rings.next().filter(|r| r.len() >= 3) {
                    out.push(Polygon::new(exterior, rings.collect()));
                }
            }
            4..=7 => {
                let n = self.u32(little)?;
                for _ in 0..n {
                    self.geometry(out)?;
                }
            }
            other => return Err(format!("unsupported WKB geometry type {}", other)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le_polygon(rings: &[&[(f64, f64)]]) -> Vec<u8> {
        let mut wkb = vec![1u8];
        wkb.extend(3u32.to_le_bytes());
        wkb.extend((rings.len() as u32).to_le_bytes());
        for ring in rings {
            wkb.extend((ring.len() as u32).to_le_bytes());
            for (x, y) in ring.iter() {
                wkb.extend(x.to_le_bytes());
                wkb.extend(y.to_le_bytes());
            }
        }
        wkb
    }

    fn with_header(flags: u8, envelope: usize, wkb: &[u8]) -> Vec<u8> {
        let mut blob = vec![b'G', b'P', 0, flags];
        blob.extend(4326i32.to_le_bytes());
        blob.extend(std::iter::repeat(0u8).take(envelope));
        blob.extend_from_slice(wkb);
        blob
    }

    const SQUARE: &[(f64, f64)] = &[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)];
    const HOLE: &[(f64, f64)] = &[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 1.0)];

    #[test]
    fn test_polygon_with_envelope() {
        let blob = with_header(0b0000_0011, 32, &le_polygon(&[SQUARE, HOLE]));
        let geometry = parse_gpkg_geometry(&blob).unwrap().unwrap();
        assert_eq!(geometry.polygons().len(), 1);
        assert_eq!(geometry.polygons()[0].interiors.len(), 1);
        assert_eq!(geometry.area(), 16.0 - 0.5);
    }

    #[test]
    fn test_big_endian_multipolygon() {
        let mut wkb = vec![0u8];
        wkb.extend(6u32.to_be_bytes());
        wkb.extend(2u32.to_be_bytes());
        // Parts keep their own byte order
        wkb.extend(le_polygon(&[SQUARE]));
        wkb.extend(le_polygon(&[HOLE]));
        let geometry = parse_gpkg_geometry(&with_header(1, 0, &wkb)).unwrap().unwrap();
        assert_eq!(geometry.polygons().len(), 2);
    }

    #[test]
    fn test_empty_and_non_areal() {
        assert_eq!(parse_gpkg_geometry(&with_header(0x11, 0, &[])).unwrap(), None);

        let mut point = vec![1u8];
        point.extend(1u32.to_le_bytes());
        point.extend(7.5f64.to_le_bytes());
        point.extend(46.8f64.to_le_bytes());
        assert_eq!(parse_gpkg_geometry(&with_header(1, 0, &point)).unwrap(), None);
    }

    #[test]
    fn test_malformed_blobs() {
        assert!(parse_gpkg_geometry(b"XX\0\x01\0\0\0\0").is_err());
        let truncated = with_header(1, 0, &le_polygon(&[SQUARE]));
        assert!(parse_gpkg_geometry(&truncated[..truncated.len() - 4]).is_err());
    }
}
