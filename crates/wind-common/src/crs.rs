//! Coordinate Reference System codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::BoundingBox;

/// Well-known CRS codes supported for polygons and map output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
    /// Swiss CH1903+ / LV95 (meters, 7-digit eastings)
    Epsg2056,
    /// Swiss CH1903 / LV03 (meters, 6-digit eastings)
    Epsg21781,
}

impl CrsCode {
    /// Parse a CRS identifier.
    ///
    /// Accepts formats like:
    /// - "EPSG:2056" / "epsg:2056"
    /// - "CRS:84" (lon/lat WGS84)
    /// - OGC URNs: "urn:ogc:def:crs:EPSG::2056", "urn:ogc:def:crs:OGC:1.3:CRS84"
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();

        let code = if let Some(rest) = normalized.strip_prefix("URN:OGC:DEF:CRS:") {
            if rest.ends_with("CRS84") {
                return Ok(CrsCode::Epsg4326);
            }
            rest.rsplit(':').next().unwrap_or_default().to_string()
        } else if let Some(rest) = normalized.strip_prefix("EPSG:") {
            rest.to_string()
        } else {
            normalized.clone()
        };

        match code.as_str() {
            "4326" | "CRS:84" | "4258" => Ok(CrsCode::Epsg4326),
            "3857" | "900913" => Ok(CrsCode::Epsg3857),
            "2056" => Ok(CrsCode::Epsg2056),
            "21781" => Ok(CrsCode::Epsg21781),
            _ => Err(CrsParseError::UnsupportedCrs(s.to_string())),
        }
    }

    /// Numeric EPSG code.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg3857 => 3857,
            CrsCode::Epsg2056 => 2056,
            CrsCode::Epsg21781 => 21781,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }

    /// Area of use in the CRS's own units.
    pub fn valid_bounds(&self) -> BoundingBox {
        match self {
            CrsCode::Epsg4326 => BoundingBox::new(-180.0, -90.0, 180.0, 90.0),
            CrsCode::Epsg3857 => {
                // Web Mercator bounds (approx ±85.06° latitude)
                let max_extent = 20037508.342789244;
                BoundingBox::new(-max_extent, -max_extent, max_extent, max_extent)
            }
            CrsCode::Epsg2056 => BoundingBox::new(2420000.0, 1030000.0, 2900000.0, 1350000.0),
            CrsCode::Epsg21781 => BoundingBox::new(420000.0, 30000.0, 900000.0, 350000.0),
        }
    }
}

impl FromStr for CrsCode {
    type Err = CrsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CrsCode {
    type Error = CrsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CrsCode> for String {
    fn from(code: CrsCode) -> Self {
        code.to_string()
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}
