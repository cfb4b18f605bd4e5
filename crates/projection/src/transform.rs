//! CRS-to-CRS point transformation through WGS84.

use wind_common::CrsCode;

use crate::{ProjectionError, ProjectionResult, SwissGrid, WebMercator};

/// A single supported projection, viewed from geographic coordinates.
#[derive(Debug, Clone, Copy)]
pub enum Projection {
    Geographic,
    WebMercator(WebMercator),
    Swiss(SwissGrid),
}

impl Projection {
    pub fn for_crs(crs: CrsCode) -> Self {
        match crs {
            CrsCode::Epsg4326 => Projection::Geographic,
            CrsCode::Epsg3857 => Projection::WebMercator(WebMercator),
            CrsCode::Epsg2056 => Projection::Swiss(SwissGrid::lv95()),
            CrsCode::Epsg21781 => Projection::Swiss(SwissGrid::lv03()),
        }
    }

    /// Lon/lat degrees to projected coordinates.
    pub fn from_geographic(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        match self {
            Projection::Geographic => Some((lon, lat)),
            Projection::WebMercator(p) => p.from_geographic(lon, lat),
            Projection::Swiss(p) => p.from_geographic(lon, lat),
        }
    }

    /// Projected coordinates to lon/lat degrees.
    pub fn to_geographic(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        match self {
            Projection::Geographic => Some((x, y)),
            Projection::WebMercator(p) => p.to_geographic(x, y),
            Projection::Swiss(p) => p.to_geographic(x, y),
        }
    }
}

/// Converts points from one CRS to another.
#[derive(Debug, Clone, Copy)]
pub struct Transformer {
    source: CrsCode,
    target: CrsCode,
    from: Projection,
    to: Projection,
}

impl Transformer {
    pub fn new(source: CrsCode, target: CrsCode) -> Self {
        Self {
            source,
            target,
            from: Projection::for_crs(source),
            to: Projection::for_crs(target),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }

    pub fn transform(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        if self.is_identity() {
            return Ok((x, y));
        }
        let (lon, lat) = self
            .from
            .to_geographic(x, y)
            .ok_or_else(|| ProjectionError::OutOfDomain {
                x,
                y,
                crs: self.source.to_string(),
            })?;
        self.to
            .from_geographic(lon, lat)
            .ok_or_else(|| ProjectionError::OutOfDomain {
                x: lon,
                y: lat,
                crs: self.target.to_string(),
            })
    }
}
