//! Annual averages over a region.
//!
//! A region is given as a `[y][x]` cell mask. Each year's value pools every
//! valid sample of every selected cell over all time steps in that year.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;
use tracing::debug;
use wind_common::{DatasetKey, GridArray};

use crate::error::{StatsError, StatsResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnnualPoint {
    pub year: i32,
    pub wind_speed: f64,
}

/// One dataset's annual series, in year order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualSeries {
    pub dataset: DatasetKey,
    pub points: Vec<AnnualPoint>,
}

/// Mean of all valid samples of the masked cells, per calendar year.
///
/// Years whose selection holds no valid sample yield NaN.
pub fn annual_masked_mean(grid: &GridArray, mask: &[bool]) -> StatsResult<Vec<AnnualPoint>> {
    if mask.len() != grid.n_cells() {
        return Err(StatsError::ShapeMismatch(format!(
            "mask of {} cells for '{}' with {} cells",
            mask.len(),
            grid.name,
            grid.n_cells()
        )));
    }

    let mut per_year: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for (t, time) in grid.times.iter().enumerate() {
        let entry = per_year.entry(time.year()).or_insert((0.0, 0));
        for (&v, &selected) in grid.time_slice(t).iter().zip(mask) {
            if selected && v.is_finite() {
                entry.0 += v as f64;
                entry.1 += 1;
            }
        }
    }

    Ok(per_year
        .into_iter()
        .map(|(year, (sum, count))| AnnualPoint {
            year,
            wind_speed: if count == 0 { f64::NAN } else { sum / count as f64 },
        })
        .collect())
}

/// Average of the `intersects` and `within` annual means.
///
/// Cells touching the border count in one selection but not the other, so
/// the average sits between an inclusive and an exclusive reading of the
/// region.
pub fn national_annual_average(
    dataset: DatasetKey,
    grid: &GridArray,
    intersects: &[bool],
    within: &[bool],
) -> StatsResult<AnnualSeries> {
    let inclusive = annual_masked_mean(grid, intersects)?;
    let exclusive = annual_masked_mean(grid, within)?;

    debug!(
        dataset = %dataset,
        intersects = intersects.iter().filter(|&&m| m).count(),
        within = within.iter().filter(|&&m| m).count(),
        "Selected cells for annual average"
    );

    let points = inclusive
        .iter()
        .zip(&exclusive)
        .map(|(a, b)| AnnualPoint {
            year: a.year,
            wind_speed: (a.wind_speed + b.wind_speed) / 2.0,
        })
        .collect();

    Ok(AnnualSeries { dataset, points })
}

/// One row of the concatenated annual table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualRow {
    pub dataset: DatasetKey,
    /// Years are kept as strings so they plot as categories.
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "Wind speed")]
    pub wind_speed: f64,
}

/// Annual series of several datasets, concatenated in dataset order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnnualTable {
    pub rows: Vec<AnnualRow>,
}

impl AnnualTable {
    pub fn from_series(series: &[AnnualSeries]) -> Self {
        let rows = series
            .iter()
            .flat_map(|s| {
                s.points.iter().map(move |p| AnnualRow {
                    dataset: s.dataset,
                    year: p.year.to_string(),
                    wind_speed: p.wind_speed,
                })
            })
            .collect();
        Self { rows }
    }

    /// Datasets in first-appearance order.
    pub fn datasets(&self) -> Vec<DatasetKey> {
        let mut out = Vec::new();
        for row in &self.rows {
            if !out.contains(&row.dataset) {
                out.push(row.dataset);
            }
        }
        out
    }

    /// Year categories in first-appearance order.
    pub fn years(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !out.contains(&row.year.as_str()) {
                out.push(&row.year);
            }
        }
        out
    }

    /// `(year, wind speed)` pairs of one dataset.
    pub fn series(&self, dataset: DatasetKey) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.rows
            .iter()
            .filter(move |r| r.dataset == dataset)
            .map(|r| (r.year.as_str(), r.wind_speed))
    }

    /// Finite minimum and maximum of the wind-speed column.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.rows
            .iter()
            .map(|r| r.wind_speed)
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
