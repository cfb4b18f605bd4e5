//! Colour range shared by several maps.

use serde::{Deserialize, Serialize};
use wind_common::CellField;

/// Running minimum and maximum over finite field values.
///
/// Starts at `min = 1e10`, `max = 0` so that a range folded over nothing
/// is recognisably unset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ValueRange {
    fn default() -> Self {
        Self { min: 1e10, max: 0.0 }
    }
}

impl ValueRange {
    /// Widen the range to cover `field`.
    pub fn include(self, field: &CellField) -> Self {
        match field.finite_range() {
            Some((lo, hi)) => Self {
                min: self.min.min(lo),
                max: self.max.max(hi),
            },
            None => self,
        }
    }

    /// Range covering every field.
    pub fn over<'a>(fields: impl IntoIterator<Item = &'a CellField>) -> Self {
        fields.into_iter().fold(Self::default(), Self::include)
    }

    /// False until at least one finite value has been folded in.
    pub fn is_set(&self) -> bool {
        self.min <= self.max
    }
}
