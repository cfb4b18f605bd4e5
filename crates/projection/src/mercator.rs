//! Spherical Web Mercator (EPSG:3857).

use std::f64::consts::PI;

/// Sphere radius used by EPSG:3857 (WGS84 semi-major axis).
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Latitude limit where the projection becomes square.
pub const MAX_LATITUDE: f64 = 85.05112877980659;

#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl WebMercator {
    /// Project lon/lat degrees to meters. `None` beyond ±85.05°.
    pub fn from_geographic(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !(-MAX_LATITUDE..=MAX_LATITUDE).contains(&lat) {
            return None;
        }
        let x = EARTH_RADIUS * lon.to_radians();
        let y = EARTH_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
        Some((x, y))
    }

    /// Unproject meters to lon/lat degrees.
    pub fn to_geographic(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let lon = (x / EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
        Some((lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin() {
        let (x, y) = WebMercator.from_geographic(0.0, 0.0).unwrap();
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-9);
    }

    #[test]
    fn test_roundtrip_bern() {
        let (x, y) = WebMercator.from_geographic(7.44, 46.95).unwrap();
        let (lon, lat) = WebMercator.to_geographic(x, y).unwrap();
        assert!((lon - 7.44).abs() < 1e-9);
        assert!((lat - 46.95).abs() < 1e-9);
    }

    #[test]
    fn test_pole_rejected() {
        assert!(WebMercator.from_geographic(0.0, 89.0).is_none());
    }
}
