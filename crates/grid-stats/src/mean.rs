//! Per-gridcell temporal mean.

use rayon::prelude::*;
use wind_common::{CellField, GridArray};

/// Mean of the finite values; NaN when there are none.
pub(crate) fn nan_mean(values: impl Iterator<Item = f32>) -> f64 {
    let (sum, count) = values
        .filter(|v| v.is_finite())
        .fold((0.0f64, 0usize), |(s, n), v| (s + v as f64, n + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Average every cell over all time steps, skipping missing samples.
pub fn temporal_mean(grid: &GridArray) -> CellField {
    let values = (0..grid.n_cells())
        .into_par_iter()
        .map(|cell| nan_mean(grid.cell_series(cell)))
        .collect();

    CellField {
        x: grid.x.clone(),
        y: grid.y.clone(),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{constant_wind_grid, ramp_wind_grid, with_missing, yearly_times};

    #[test]
    fn test_constant_grid_mean() {
        let grid = constant_wind_grid("c", yearly_times(&[2010], 5), 3, 2, 4.5);
        let mean = temporal_mean(&grid);
        assert_eq!(mean.values, vec![4.5; 6]);
        assert_eq!(mean.x, grid.x);
    }

    #[test]
    fn test_ramp_mean() {
        // t in 0..4 adds 1.5 on average
        let grid = ramp_wind_grid("r", yearly_times(&[2010], 4), 2, 2);
        let mean = temporal_mean(&grid);
        assert_eq!(mean.get(0, 0), 1.5);
        assert_eq!(mean.get(1, 1), 12.5);
    }

    #[test]
    fn test_missing_samples_are_skipped() {
        let grid = ramp_wind_grid("r", yearly_times(&[2010], 3), 1, 1);
        let grid = with_missing(grid, &[(2, 0, 0)]);
        assert_eq!(temporal_mean(&grid).values[0], 0.5);
    }

    #[test]
    fn test_all_missing_is_nan() {
        let grid = with_missing(
            constant_wind_grid("c", yearly_times(&[2010], 2), 2, 1, 1.0),
            &[(0, 0, 1), (1, 0, 1)],
        );
        let mean = temporal_mean(&grid);
        assert_eq!(mean.values[0], 1.0);
        assert!(mean.values[1].is_nan());
    }
}
