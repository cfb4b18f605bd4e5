//! In-memory gridded arrays.
//!
//! A [`GridArray`] is a `(time, y, x)` cube of wind speeds with its
//! coordinate labels; a [`CellField`] is a `(y, x)` field produced by
//! reducing a cube over time.

use chrono::{Datelike, NaiveDateTime};

use crate::{WindError, WindResult, YearRange};

/// Time-major cube of values with coordinate labels.
///
/// `values` is row-major `[time][y][x]`; missing samples are NaN.
#[derive(Debug, Clone)]
pub struct GridArray {
    pub name: String,
    pub x_name: String,
    pub y_name: String,
    pub times: Vec<NaiveDateTime>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub values: Vec<f32>,
}

impl GridArray {
    pub fn new(
        name: impl Into<String>,
        x_name: impl Into<String>,
        y_name: impl Into<String>,
        times: Vec<NaiveDateTime>,
        x: Vec<f64>,
        y: Vec<f64>,
        values: Vec<f32>,
    ) -> WindResult<Self> {
        let expected = times.len() * y.len() * x.len();
        if values.len() != expected {
            return Err(WindError::ShapeMismatch(format!(
                "{} values for {} times x {} rows x {} cols",
                values.len(),
                times.len(),
                y.len(),
                x.len()
            )));
        }
        Ok(Self {
            name: name.into(),
            x_name: x_name.into(),
            y_name: y_name.into(),
            times,
            x,
            y,
            values,
        })
    }

    pub fn nt(&self) -> usize {
        self.times.len()
    }

    pub fn ny(&self) -> usize {
        self.y.len()
    }

    pub fn nx(&self) -> usize {
        self.x.len()
    }

    /// Number of spatial cells per time step.
    pub fn n_cells(&self) -> usize {
        self.nx() * self.ny()
    }

    #[inline]
    pub fn get(&self, t: usize, iy: usize, ix: usize) -> f32 {
        self.values[t * self.n_cells() + iy * self.nx() + ix]
    }

    /// All samples of one cell, in time order.
    pub fn cell_series(&self, cell: usize) -> impl Iterator<Item = f32> + Clone + '_ {
        self.values.iter().skip(cell).step_by(self.n_cells().max(1)).copied()
    }

    /// One time step as a `[y][x]` slice.
    pub fn time_slice(&self, t: usize) -> &[f32] {
        let n = self.n_cells();
        &self.values[t * n..(t + 1) * n]
    }

    /// Keep only time steps inside `years`.
    pub fn select_years(&self, years: &YearRange) -> GridArray {
        let mut times = Vec::new();
        let mut values = Vec::new();
        for (t, time) in self.times.iter().enumerate() {
            if years.contains(time) {
                times.push(*time);
                values.extend_from_slice(self.time_slice(t));
            }
        }
        GridArray {
            name: self.name.clone(),
            x_name: self.x_name.clone(),
            y_name: self.y_name.clone(),
            times,
            x: self.x.clone(),
            y: self.y.clone(),
            values,
        }
    }

    /// Replace the time labels, keeping the data untouched.
    pub fn with_times(mut self, times: Vec<NaiveDateTime>) -> WindResult<GridArray> {
        if times.len() != self.times.len() {
            return Err(WindError::ShapeMismatch(format!(
                "cannot relabel {} time steps of '{}' with {} labels",
                self.times.len(),
                self.name,
                times.len()
            )));
        }
        self.times = times;
        Ok(self)
    }

    /// True when both arrays have the same number of rows and columns.
    pub fn same_grid_shape(&self, other: &GridArray) -> bool {
        self.nx() == other.nx() && self.ny() == other.ny()
    }

    /// Distinct calendar years in time order.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.times.iter().map(|t| t.year()).collect();
        years.dedup();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// Index lookups for the x and y coordinate labels.
    pub fn coord_index(&self) -> (CoordIndex, CoordIndex) {
        (CoordIndex::new(&self.x), CoordIndex::new(&self.y))
    }
}

/// A `(y, x)` field of reduced values on a dataset grid.
#[derive(Debug, Clone)]
pub struct CellField {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// Row-major `[y][x]`
    pub values: Vec<f64>,
}

impl CellField {
    pub fn nx(&self) -> usize {
        self.x.len()
    }

    pub fn ny(&self) -> usize {
        self.y.len()
    }

    pub fn get(&self, iy: usize, ix: usize) -> f64 {
        self.values[iy * self.nx() + ix]
    }

    /// Minimum and maximum over finite values.
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Look a value up by coordinate labels.
    pub fn lookup(&self, x_index: &CoordIndex, y_index: &CoordIndex, x: f64, y: f64) -> Option<f64> {
        let ix = x_index.find(x)?;
        let iy = y_index.find(y)?;
        Some(self.get(iy, ix))
    }
}

/// Maps coordinate labels back to array indices.
///
/// Labels read from NetCDF are often single precision while polygon tables
/// store them as doubles, so lookups match within a small fraction of the
/// grid spacing.
#[derive(Debug, Clone)]
pub struct CoordIndex {
    sorted: Vec<(f64, usize)>,
    tolerance: f64,
}

impl CoordIndex {
    pub fn new(coords: &[f64]) -> Self {
        let mut sorted: Vec<(f64, usize)> = coords
            .iter()
            .copied()
            .enumerate()
            .map(|(i, c)| (c, i))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let min_spacing = sorted
            .windows(2)
            .map(|w| (w[1].0 - w[0].0).abs())
            .filter(|d| *d > 0.0)
            .fold(f64::INFINITY, f64::min);
        let tolerance = if min_spacing.is_finite() {
            min_spacing * 1e-3
        } else {
            1e-9
        };

        Self { sorted, tolerance }
    }

    /// Index of the label equal to `value` (within tolerance).
    pub fn find(&self, value: f64) -> Option<usize> {
        if self.sorted.is_empty() || !value.is_finite() {
            return None;
        }
        let pos = self.sorted.partition_point(|(c, _)| *c < value);
        let candidates = [pos.checked_sub(1), Some(pos)];
        candidates
            .into_iter()
            .flatten()
            .filter_map(|i| self.sorted.get(i))
            .filter(|(c, _)| (c - value).abs() <= self.tolerance)
            .min_by(|a, b| (a.0 - value).abs().total_cmp(&(b.0 - value).abs()))
            .map(|(_, i)| *i)
    }
}
