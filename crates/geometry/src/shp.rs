//! ESRI shapefile reading.
//!
//! Polygon shapes (plain, M and Z) become features; attribute records
//! become properties. The CRS is read from the `.prj` WKT when there is
//! one.

use std::collections::HashMap;
use std::io::Cursor;

use serde_json::{Number, Value};
use shapefile::dbase::{self, FieldValue};
use shapefile::{Point, PointM, PointZ, PolygonRing, Shape};
use tracing::{debug, warn};
use wind_common::CrsCode;

use crate::error::{GeometryError, GeometryResult};
use crate::geojson::{AreaFeature, FeatureSource};
use crate::polygon::{MultiPolygon, Polygon, Ring};

/// Parse the `.shp` and `.dbf` contents of one shapefile.
pub fn parse_shapefile(
    shp: &[u8],
    dbf: &[u8],
    prj: Option<&str>,
    origin: &str,
) -> GeometryResult<FeatureSource> {
    let invalid = |message: String| GeometryError::Shapefile {
        path: origin.to_string(),
        message,
    };

    let crs = match prj {
        Some(wkt) => crs_from_wkt(wkt).ok_or_else(|| GeometryError::UnsupportedCrs {
            path: origin.to_string(),
            name: wkt.chars().take(60).collect(),
        })?,
        None => {
            warn!(source = origin, "Shapefile has no .prj, assuming WGS84 lon/lat");
            CrsCode::Epsg4326
        }
    };

    let shapes = shapefile::ShapeReader::new(Cursor::new(shp)).map_err(|e| invalid(e.to_string()))?;
    let records = dbase::Reader::new(Cursor::new(dbf)).map_err(|e| invalid(e.to_string()))?;
    let mut reader = shapefile::Reader::new(shapes, records);

    let mut features = Vec::new();
    let mut skipped = 0usize;
    for (index, entry) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = entry.map_err(|e| invalid(e.to_string()))?;
        let rings = match &shape {
            Shape::Polygon(p) => collect_rings(p.rings(), |pt: &Point| (pt.x, pt.y)),
            Shape::PolygonM(p) => collect_rings(p.rings(), |pt: &PointM| (pt.x, pt.y)),
            Shape::PolygonZ(p) => collect_rings(p.rings(), |pt: &PointZ| (pt.x, pt.y)),
            _ => Vec::new(),
        };
        match assemble(rings) {
            Some(geometry) => {
                let fields: HashMap<String, FieldValue> = record.into();
                features.push(AreaFeature {
                    index,
                    geometry,
                    properties: fields.into_iter().map(|(k, v)| (k, field_to_json(v))).collect(),
                });
            }
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(source = origin, skipped, "Skipped shapes without areal geometry");
    }
    Ok(FeatureSource { crs, features })
}

/// Rings tagged outer (`true`) or inner.
fn collect_rings<P>(rings: &[PolygonRing<P>], xy: impl Fn(&P) -> (f64, f64)) -> Vec<(bool, Ring)> {
    rings
        .iter()
        .map(|ring| match ring {
            PolygonRing::Outer(points) => (true, Ring::new(points.iter().map(&xy).collect())),
            PolygonRing::Inner(points) => (false, Ring::new(points.iter().map(&xy).collect())),
        })
        .collect()
}

/// Each outer ring starts a polygon; inner rings are holes of the
/// polygon before them.
fn assemble(rings: Vec<(bool, Ring)>) -> Option<MultiPolygon> {
    let mut polygons: Vec<Polygon> = Vec::new();
    for (outer, ring) in rings {
        if ring.len() < 3 {
            continue;
        }
        match polygons.last_mut() {
            Some(polygon) if !outer => polygon.interiors.push(ring),
            _ => polygons.push(Polygon::new(ring, Vec::new())),
        }
    }
    (!polygons.is_empty()).then(|| MultiPolygon::new(polygons))
}

fn number(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

fn field_to_json(value: FieldValue) -> Value {
    match value {
        FieldValue::Character(Some(s)) | FieldValue::Memo(s) => Value::String(s.trim_end().to_string()),
        FieldValue::Numeric(Some(v)) | FieldValue::Double(v) | FieldValue::Currency(v) => number(v),
        FieldValue::Float(Some(v)) => number(f64::from(v)),
        FieldValue::Integer(v) => Value::from(v),
        FieldValue::Logical(Some(b)) => Value::Bool(b),
        _ => Value::Null,
    }
}

/// CRS named by a `.prj` WKT string.
///
/// ESRI `.prj` files rarely carry EPSG authority codes, so the projection
/// name decides.
pub fn crs_from_wkt(wkt: &str) -> Option<CrsCode> {
    let upper = wkt.trim().to_ascii_uppercase();
    if let Some(code) = authority_code(&upper) {
        if let Ok(crs) = CrsCode::parse(&format!("EPSG:{}", code)) {
            return Some(crs);
        }
    }

    let head: String = upper.chars().take_while(|c| *c != '[').collect();
    match head.trim() {
        "GEOGCS" | "GEOGCRS" => {
            let datum_ok = ["WGS", "ETRS", "D_WGS_1984", "ETRF"].iter().any(|d| upper.contains(d));
            datum_ok.then_some(CrsCode::Epsg4326)
        }
        "PROJCS" | "PROJCRS" => {
            if upper.contains("LV95") || upper.contains("CH1903+") || upper.contains("CH1903_PLUS") {
                Some(CrsCode::Epsg2056)
            } else if upper.contains("LV03") || upper.contains("CH1903") {
                Some(CrsCode::Epsg21781)
            } else if upper.contains("PSEUDO") || upper.contains("AUXILIARY_SPHERE") || upper.contains("WEB_MERCATOR") {
                Some(CrsCode::Epsg3857)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Outermost `AUTHORITY["EPSG","<code>"]`, which is the last one in WKT1.
fn authority_code(upper: &str) -> Option<String> {
    let start = upper.rfind("AUTHORITY[\"EPSG\",")? + "AUTHORITY[\"EPSG\",".len();
    let rest = &upper[start..];
    let code: String = rest
        .trim_start_matches(|c: char| c == '"' || c.is_whitespace())
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    (!code.is_empty()).then_some(code)
}
