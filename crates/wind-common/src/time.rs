//! Time selection helpers.

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::WindError;

/// An inclusive range of calendar years, e.g. 2009..=2013.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct YearRange {
    pub start_year: i32,
    pub end_year: i32,
}

impl Default for YearRange {
    fn default() -> Self {
        Self {
            start_year: 2009,
            end_year: 2013,
        }
    }
}

impl YearRange {
    pub fn new(start_year: i32, end_year: i32) -> Result<Self, WindError> {
        let range = Self {
            start_year,
            end_year,
        };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), WindError> {
        if self.start_year > self.end_year {
            return Err(WindError::InvalidYearRange {
                start: self.start_year,
                end: self.end_year,
            });
        }
        Ok(())
    }

    /// Whether a timestamp falls anywhere inside the covered years.
    pub fn contains(&self, time: &NaiveDateTime) -> bool {
        let year = time.year();
        year >= self.start_year && year <= self.end_year
    }
}
