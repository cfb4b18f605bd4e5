//! CF-convention time coordinate decoding.
//!
//! Handles `"<unit> since <reference>"` units on the standard (proleptic
//! Gregorian) calendar, which is what reanalysis products write.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::error::{NetCdfError, NetCdfResult};

/// Parsed `units` attribute of a time coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeUnits {
    /// Seconds per unit step
    pub seconds_per_unit: f64,
    pub reference: NaiveDateTime,
}

impl TimeUnits {
    pub fn parse(units: &str) -> NetCdfResult<Self> {
        let unsupported = || NetCdfError::UnsupportedTimeUnits(units.to_string());

        let (unit, reference) = units.split_once(" since ").ok_or_else(unsupported)?;
        let seconds_per_unit = match unit.trim().to_lowercase().as_str() {
            "seconds" | "second" | "secs" | "sec" | "s" => 1.0,
            "minutes" | "minute" | "mins" | "min" => 60.0,
            "hours" | "hour" | "hrs" | "hr" | "h" => 3600.0,
            "days" | "day" | "d" => 86400.0,
            _ => return Err(unsupported()),
        };
        let reference = parse_reference(reference.trim()).ok_or_else(unsupported)?;

        Ok(Self {
            seconds_per_unit,
            reference,
        })
    }

    /// Convert one raw offset to a timestamp, rounded to the millisecond.
    ///
    /// Offsets that are not finite or land outside the representable date
    /// range (an unmasked fill value, say) are an error.
    pub fn decode(&self, value: f64) -> NetCdfResult<NaiveDateTime> {
        let out_of_range = || NetCdfError::InvalidTime(value);

        let millis = (value * self.seconds_per_unit * 1000.0).round();
        // Duration::milliseconds panics past i64::MAX / 1000
        if !millis.is_finite() || millis.abs() >= (i64::MAX / 1000) as f64 {
            return Err(out_of_range());
        }
        self.reference
            .checked_add_signed(Duration::milliseconds(millis as i64))
            .ok_or_else(out_of_range)
    }
}

/// Decode a whole time coordinate.
pub fn decode_times(values: &[f64], units: &str) -> NetCdfResult<Vec<NaiveDateTime>> {
    let units = TimeUnits::parse(units)?;
    values.iter().map(|&v| units.decode(v)).collect()
}

fn parse_reference(s: &str) -> Option<NaiveDateTime> {
    // Drop a trailing UTC designator; offsets other than UTC are not used
    // by the products this reads.
    let s = s
        .trim_end_matches('Z')
        .trim_end_matches(" UTC")
        .trim_end_matches("+00:00")
        .trim();

    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for format in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    // CF allows non-padded dates such as "1-1-1" or "2009-1-1"
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymdh(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_hours_since() {
        let times = decode_times(&[0.0, 1.0, 25.0], "hours since 2009-01-01 00:00:00").unwrap();
        assert_eq!(times[0], ymdh(2009, 1, 1, 0, 0));
        assert_eq!(times[1], ymdh(2009, 1, 1, 1, 0));
        assert_eq!(times[2], ymdh(2009, 1, 2, 1, 0));
    }

    #[test]
    fn test_minutes_since_iso_reference() {
        let times = decode_times(&[15.0], "minutes since 2009-01-01T00:00:00Z").unwrap();
        assert_eq!(times[0], ymdh(2009, 1, 1, 0, 15));
    }

    #[test]
    fn test_days_since_date_only() {
        let times = decode_times(&[0.5], "days since 1970-1-1").unwrap();
        assert_eq!(times[0], ymdh(1970, 1, 1, 12, 0));
    }

    #[test]
    fn test_unsupported_units() {
        assert!(TimeUnits::parse("months since 2000-01-01").is_err());
        assert!(TimeUnits::parse("hours").is_err());
    }

    #[test]
    fn test_fill_value_offset_is_an_error() {
        let units = TimeUnits::parse("hours since 2009-01-01 00:00:00").unwrap();
        let err = units.decode(9.969209968386869e36).unwrap_err();
        assert!(matches!(err, NetCdfError::InvalidTime(_)));
        assert!(units.decode(f64::NAN).is_err());
        assert!(units.decode(f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_decode_times_propagates_bad_offset() {
        let result = decode_times(&[0.0, 1.0e30], "seconds since 2009-01-01");
        assert!(matches!(result, Err(NetCdfError::InvalidTime(v)) if v == 1.0e30));
    }

    #[test]
    fn test_decode_past_date_range() {
        // Finite milliseconds that still overflow chrono's year range
        let units = TimeUnits::parse("days since 2009-01-01").unwrap();
        assert!(units.decode(1.0e9).is_err());
        assert_eq!(units.decode(-1.0).unwrap(), ymdh(2008, 12, 31, 0, 0));
    }
}
