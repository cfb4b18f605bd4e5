//! Swiss national grids (CH1903 / LV03 and CH1903+ / LV95).
//!
//! Uses the swisstopo approximate polynomial formulas, accurate to about
//! one meter inside Switzerland. LV95 differs from LV03 by a fixed false
//! easting/northing of 2 000 000 m / 1 000 000 m.

/// Which Swiss grid the coordinates are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwissGridVariant {
    /// EPSG:21781
    Lv03,
    /// EPSG:2056
    Lv95,
}

/// Swiss oblique Mercator grid.
#[derive(Debug, Clone, Copy)]
pub struct SwissGrid {
    pub variant: SwissGridVariant,
}

/// Rough validity window in degrees; the polynomials diverge far outside.
const LON_RANGE: (f64, f64) = (3.0, 13.0);
const LAT_RANGE: (f64, f64) = (43.0, 50.0);

impl SwissGrid {
    pub fn lv03() -> Self {
        Self {
            variant: SwissGridVariant::Lv03,
        }
    }

    pub fn lv95() -> Self {
        Self {
            variant: SwissGridVariant::Lv95,
        }
    }

    fn false_origin(&self) -> (f64, f64) {
        match self.variant {
            SwissGridVariant::Lv03 => (0.0, 0.0),
            SwissGridVariant::Lv95 => (2_000_000.0, 1_000_000.0),
        }
    }

    /// WGS84 lon/lat degrees to (easting, northing) meters.
    pub fn from_geographic(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !(LON_RANGE.0..=LON_RANGE.1).contains(&lon) || !(LAT_RANGE.0..=LAT_RANGE.1).contains(&lat) {
            return None;
        }

        // Auxiliary values in units of 10000 arc-seconds relative to Bern
        let phi = (lat * 3600.0 - 169028.66) / 10000.0;
        let lambda = (lon * 3600.0 - 26782.5) / 10000.0;

        let east = 600072.37 + 211455.93 * lambda
            - 10938.51 * lambda * phi
            - 0.36 * lambda * phi.powi(2)
            - 44.54 * lambda.powi(3);

        let north = 200147.07 + 308807.95 * phi + 3745.25 * lambda.powi(2) + 76.63 * phi.powi(2)
            - 194.56 * lambda.powi(2) * phi
            + 119.79 * phi.powi(3);

        let (e0, n0) = self.false_origin();
        Some((east + e0, north + n0))
    }

    /// (easting, northing) meters to WGS84 lon/lat degrees.
    pub fn to_geographic(&self, east: f64, north: f64) -> Option<(f64, f64)> {
        let (e0, n0) = self.false_origin();
        let y = (east - e0 - 600000.0) / 1_000_000.0;
        let x = (north - n0 - 200000.0) / 1_000_000.0;

        let lambda = 2.6779094 + 4.728982 * y + 0.791484 * y * x + 0.1306 * y * x.powi(2)
            - 0.0436 * y.powi(3);
        let phi = 16.9023892 + 3.238272 * x
            - 0.270978 * y.powi(2)
            - 0.002528 * x.powi(2)
            - 0.0447 * y.powi(2) * x
            - 0.0140 * x.powi(3);

        let lon = lambda * 100.0 / 36.0;
        let lat = phi * 100.0 / 36.0;
        Some((lon, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // swisstopo reference point: 46°2'38.87" N, 8°43'49.79" E
    const REF_LAT: f64 = 46.0 + 2.0 / 60.0 + 38.87 / 3600.0;
    const REF_LON: f64 = 8.0 + 43.0 / 60.0 + 49.79 / 3600.0;

    #[test]
    fn test_lv03_reference_point() {
        let (e, n) = SwissGrid::lv03().from_geographic(REF_LON, REF_LAT).unwrap();
        assert!((e - 699999.76).abs() < 1.0, "easting {}", e);
        assert!((n - 99999.97).abs() < 1.0, "northing {}", n);
    }

    #[test]
    fn test_lv95_offset() {
        let (e03, n03) = SwissGrid::lv03().from_geographic(7.5, 47.0).unwrap();
        let (e95, n95) = SwissGrid::lv95().from_geographic(7.5, 47.0).unwrap();
        assert!((e95 - e03 - 2_000_000.0).abs() < 1e-6);
        assert!((n95 - n03 - 1_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_outside_window() {
        assert!(SwissGrid::lv95().from_geographic(-75.0, 40.0).is_none());
    }
}
