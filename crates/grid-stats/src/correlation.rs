//! Per-gridcell temporal correlation between two datasets on one grid.

use rayon::prelude::*;
use tracing::debug;
use wind_common::{CellField, GridArray, WindError, YearRange};

use crate::error::{StatsError, StatsResult};

/// Restrict both cubes to `period` and give `other` the time labels of
/// `reference`.
///
/// The two datasets report the same hours with slightly different stamps
/// (NEWA sits 15 minutes off COSMO), so only the step count must agree.
pub fn align_for_correlation(
    reference: &GridArray,
    other: &GridArray,
    period: &YearRange,
) -> StatsResult<(GridArray, GridArray)> {
    let reference = reference.select_years(period);
    let other = other.select_years(period);

    for grid in [&reference, &other] {
        if grid.nt() == 0 {
            return Err(StatsError::EmptyPeriod {
                name: grid.name.clone(),
                start: period.start_year,
                end: period.end_year,
            });
        }
    }

    if !reference.same_grid_shape(&other) {
        return Err(StatsError::ShapeMismatch(format!(
            "'{}' is {}x{} but '{}' is {}x{}",
            reference.name,
            reference.ny(),
            reference.nx(),
            other.name,
            other.ny(),
            other.nx()
        )));
    }

    let other = other
        .with_times(reference.times.clone())
        .map_err(|e| match e {
            WindError::ShapeMismatch(msg) => StatsError::ShapeMismatch(msg),
            e => StatsError::Grid(e),
        })?;

    debug!(
        reference = %reference.name,
        other = %other.name,
        steps = reference.nt(),
        "Aligned time axes for correlation"
    );
    Ok((reference, other))
}

/// Pearson correlation of two paired series, using only pairs where both
/// are finite. NaN with fewer than two pairs or zero variance.
pub(crate) fn pearson(pairs: impl Iterator<Item = (f32, f32)> + Clone) -> f64 {
    let valid = pairs.filter(|(a, b)| a.is_finite() && b.is_finite());

    let (sum_a, sum_b, n) = valid
        .clone()
        .fold((0.0f64, 0.0f64, 0usize), |(sa, sb, n), (a, b)| {
            (sa + a as f64, sb + b as f64, n + 1)
        });
    if n < 2 {
        return f64::NAN;
    }
    let (mean_a, mean_b) = (sum_a / n as f64, sum_b / n as f64);

    let (cov, var_a, var_b) = valid.fold((0.0f64, 0.0f64, 0.0f64), |(c, va, vb), (a, b)| {
        let da = a as f64 - mean_a;
        let db = b as f64 - mean_b;
        (c + da * db, va + da * da, vb + db * db)
    });

    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 {
        return f64::NAN;
    }
    (cov / denom).clamp(-1.0, 1.0)
}

/// Correlate two cubes cell by cell over time.
///
/// Both cubes must have the same number of time steps and the same grid
/// shape; the result carries the coordinate labels of `a`.
pub fn temporal_correlation(a: &GridArray, b: &GridArray) -> StatsResult<CellField> {
    if a.nt() != b.nt() || !a.same_grid_shape(b) {
        return Err(StatsError::ShapeMismatch(format!(
            "cannot correlate '{}' ({}x{}x{}) with '{}' ({}x{}x{})",
            a.name,
            a.nt(),
            a.ny(),
            a.nx(),
            b.name,
            b.nt(),
            b.ny(),
            b.nx()
        )));
    }

    let values = (0..a.n_cells())
        .into_par_iter()
        .map(|cell| pearson(a.cell_series(cell).zip(b.cell_series(cell))))
        .collect();

    Ok(CellField {
        x: a.x.clone(),
        y: a.y.clone(),
        values,
    })
}
