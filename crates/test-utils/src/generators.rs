//! Synthetic wind-speed grids.
//!
//! These generators create predictable, verifiable cubes so reductions
//! can be checked against hand-computed values.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use wind_common::GridArray;

/// Evenly spaced axis labels: `start, start + step, ...`.
pub fn regular_axis(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

/// `n` hourly time labels starting at `start`.
pub fn hourly_times(start: NaiveDateTime, n: usize) -> Vec<NaiveDateTime> {
    (0..n).map(|i| start + Duration::hours(i as i64)).collect()
}

/// `steps_per_year` hourly labels from 1 January 00:00 of each year.
///
/// # Example
///
/// ```
/// use test_utils::yearly_times;
///
/// let times = yearly_times(&[2009, 2010], 3);
/// assert_eq!(times.len(), 6);
/// ```
pub fn yearly_times(years: &[i32], steps_per_year: usize) -> Vec<NaiveDateTime> {
    years
        .iter()
        .filter_map(|&year| NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0))
        .flat_map(|start| hourly_times(start, steps_per_year))
        .collect()
}

/// Builds a cube by evaluating `value(t, iy, ix)` at every sample.
pub fn wind_grid<F>(
    name: &str,
    times: Vec<NaiveDateTime>,
    x: Vec<f64>,
    y: Vec<f64>,
    value: F,
) -> GridArray
where
    F: Fn(usize, usize, usize) -> f32,
{
    let mut values = Vec::with_capacity(times.len() * x.len() * y.len());
    for t in 0..times.len() {
        for iy in 0..y.len() {
            for ix in 0..x.len() {
                values.push(value(t, iy, ix));
            }
        }
    }
    GridArray::new(name, "x", "y", times, x, y, values)
        .expect("generator produced a consistent shape")
}

/// Creates a cube with the same value everywhere.
pub fn constant_wind_grid(
    name: &str,
    times: Vec<NaiveDateTime>,
    nx: usize,
    ny: usize,
    value: f32,
) -> GridArray {
    wind_grid(
        name,
        times,
        regular_axis(0.0, 1.0, nx),
        regular_axis(0.0, 1.0, ny),
        |_, _, _| value,
    )
}

/// Creates a cube whose cell `(iy, ix)` holds `ix * 10 + iy + t`.
///
/// Handy for checking that reductions keep cells apart.
pub fn ramp_wind_grid(name: &str, times: Vec<NaiveDateTime>, nx: usize, ny: usize) -> GridArray {
    wind_grid(
        name,
        times,
        regular_axis(0.0, 1.0, nx),
        regular_axis(0.0, 1.0, ny),
        |t, iy, ix| (ix * 10 + iy + t) as f32,
    )
}

/// Sets the given `(t, iy, ix)` samples to NaN.
pub fn with_missing(mut grid: GridArray, missing: &[(usize, usize, usize)]) -> GridArray {
    let (nx, n_cells) = (grid.nx(), grid.n_cells());
    for &(t, iy, ix) in missing {
        let i = t * n_cells + iy * nx + ix;
        if let Some(v) = grid.values.get_mut(i) {
            *v = f32::NAN;
        }
    }
    grid
}
