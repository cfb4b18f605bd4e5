//! GeoJSON reading.
//!
//! Only areal geometries are kept (`Polygon`, `MultiPolygon`, and those
//! nested in a `GeometryCollection`). The legacy `crs` member is
//! honoured; files without one are taken to be WGS84 lon/lat as RFC 7946
//! requires.

use std::io::Read;

use projection::Transformer;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;
use wind_common::CrsCode;

use crate::error::{GeometryError, GeometryResult};
use crate::polygon::{MultiPolygon, Polygon, Ring};

/// Top-level GeoJSON document.
#[derive(Debug, Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    #[serde(default)]
    pub crs: Option<NamedCrs>,
}

#[derive(Debug, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    #[serde(default)]
    pub crs: Option<NamedCrs>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
    GeometryCollection {
        geometries: Vec<Geometry>,
    },
    #[serde(other)]
    Unsupported,
}

/// `{"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::2056"}}`
#[derive(Debug, Deserialize)]
pub struct NamedCrs {
    pub properties: NamedCrsProperties,
}

#[derive(Debug, Deserialize)]
pub struct NamedCrsProperties {
    pub name: String,
}

impl Geometry {
    /// Areal content as a multipolygon; `None` for non-areal geometries.
    pub fn to_multipolygon(&self) -> Option<MultiPolygon> {
        let mut polygons = Vec::new();
        self.collect_polygons(&mut polygons);
        if polygons.is_empty() {
            None
        } else {
            Some(MultiPolygon::new(polygons))
        }
    }

    fn collect_polygons(&self, out: &mut Vec<Polygon>) {
        match self {
            Geometry::Polygon { coordinates } => {
                out.extend(polygon_from_rings(coordinates));
            }
            Geometry::MultiPolygon { coordinates } => {
                out.extend(coordinates.iter().filter_map(|p| polygon_from_rings(p)));
            }
            Geometry::GeometryCollection { geometries } => {
                for g in geometries {
                    g.collect_polygons(out);
                }
            }
            Geometry::Unsupported => {}
        }
    }
}

fn ring_from_positions(positions: &[Vec<f64>]) -> Ring {
    Ring::new(
        positions
            .iter()
            .filter(|p| p.len() >= 2)
            .map(|p| (p[0], p[1]))
            .collect(),
    )
}

fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> Option<Polygon> {
    let (exterior, interiors) = rings.split_first()?;
    let exterior = ring_from_positions(exterior);
    if exterior.len() < 3 {
        return None;
    }
    Some(Polygon::new(
        exterior,
        interiors.iter().map(|r| ring_from_positions(r)).collect(),
    ))
}

/// A feature reduced to what the cell tables need.
#[derive(Debug)]
pub struct AreaFeature {
    pub index: usize,
    pub geometry: MultiPolygon,
    pub properties: Map<String, Value>,
}

/// Parsed vector source with its declared CRS.
#[derive(Debug)]
pub struct FeatureSource {
    pub crs: CrsCode,
    pub features: Vec<AreaFeature>,
}

impl FeatureSource {
    /// Reproject every geometry into `target`.
    pub fn reproject(self, target: CrsCode) -> GeometryResult<FeatureSource> {
        let transformer = Transformer::new(self.crs, target);
        if transformer.is_identity() {
            return Ok(self);
        }
        let features = self
            .features
            .into_iter()
            .map(|f| {
                Ok(AreaFeature {
                    geometry: f.geometry.try_map(|x, y| transformer.transform(x, y))?,
                    ..f
                })
            })
            .collect::<GeometryResult<Vec<_>>>()?;
        Ok(FeatureSource {
            crs: target,
            features,
        })
    }
}

/// Parse GeoJSON text; `origin` names the source in errors.
pub fn parse_features(reader: impl Read, origin: &str) -> GeometryResult<FeatureSource> {
    let json_error = |source| GeometryError::Json {
        path: origin.to_string(),
        source,
    };
    let doc: Value = serde_json::from_reader(reader).map_err(json_error)?;

    let (raw_features, crs) = match doc.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => {
            let collection: FeatureCollection = serde_json::from_value(doc).map_err(json_error)?;
            (collection.features, collection.crs)
        }
        Some("Feature") => {
            let mut feature: Feature = serde_json::from_value(doc).map_err(json_error)?;
            let crs = feature.crs.take();
            (vec![feature], crs)
        }
        _ => {
            let geometry: Geometry = serde_json::from_value(doc).map_err(json_error)?;
            let feature = Feature {
                geometry: Some(geometry),
                properties: None,
                crs: None,
            };
            (vec![feature], None)
        }
    };

    let crs = match crs {
        Some(named) => CrsCode::parse(&named.properties.name).map_err(|_| {
            GeometryError::UnsupportedCrs {
                path: origin.to_string(),
                name: named.properties.name.clone(),
            }
        })?,
        None => CrsCode::Epsg4326,
    };

    let mut skipped = 0usize;
    let features = raw_features
        .into_iter()
        .enumerate()
        .filter_map(|(index, feature)| {
            let geometry = feature.geometry.as_ref().and_then(Geometry::to_multipolygon);
            match geometry {
                Some(geometry) => Some(AreaFeature {
                    index,
                    geometry,
                    properties: feature.properties.unwrap_or_default(),
                }),
                None => {
                    skipped += 1;
                    None
                }
            }
        })
        .collect::<Vec<_>>();

    if skipped > 0 {
        debug!(source = origin, skipped, "Skipped features without areal geometry");
    }

    Ok(FeatureSource { crs, features })
}

/// Numeric property value; numeric strings are accepted too.
pub fn property_f64(properties: &Map<String, Value>, key: &str) -> Option<f64> {
    match properties.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
