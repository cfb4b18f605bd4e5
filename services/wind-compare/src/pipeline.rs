//! Load, reduce, plot, write.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use geometry::{load_boundary, load_grid_cells, Boundary, GridCellTable, Predicate};
use grid_stats::{
    align_for_correlation, national_annual_average, temporal_correlation, temporal_mean,
    AnnualTable, ValueRange,
};
use netcdf_parser::read_grid_array;
use tracing::{debug, info, warn};
use wind_common::{DatasetKey, GridArray, YearRange};

use crate::config::CompareConfig;
use crate::plot;

/// Column holding the per-gridcell temporal mean
pub const AVE_WS: &str = "ave_ws";
/// Column holding the per-gridcell correlation
pub const CORR: &str = "corr";

/// Everything read from disk.
pub struct Inputs {
    pub wind_speeds: BTreeMap<DatasetKey, GridArray>,
    pub polys: BTreeMap<DatasetKey, GridCellTable>,
    pub boundary: Boundary,
}

/// Reduced data ready for plotting.
pub struct Comparison {
    pub polys: BTreeMap<DatasetKey, GridCellTable>,
    pub ws_range: ValueRange,
    pub annual: AnnualTable,
    pub boundary: Boundary,
}

pub fn load_inputs(config: &CompareConfig) -> Result<Inputs> {
    let inputs = &config.inputs;

    let mut wind_speeds = BTreeMap::new();
    for (key, path) in [
        (DatasetKey::CosmoRea2, &inputs.cosmo_wind_speed),
        (DatasetKey::CosmoRea2GriddedToNewa, &inputs.cosmo_regridded_wind_speed),
        (DatasetKey::Newa, &inputs.newa_wind_speed),
    ] {
        let array = read_grid_array(path, config.dataset(key)?, key.as_str())
            .with_context(|| format!("Failed to load wind speed for '{}' from {:?}", key, path))?;
        wind_speeds.insert(key, array);
    }
    info!(height = %config.height, "Loaded wind speed at height {}", config.height);

    let mut polys = BTreeMap::new();
    for key in DatasetKey::ALL {
        let path = match key.grid_owner() {
            DatasetKey::CosmoRea2 => &inputs.cosmo_polys,
            _ => &inputs.newa_polys,
        };
        let table = load_grid_cells(path, config.dataset(key.grid_owner())?, config.plot_crs)
            .with_context(|| format!("Failed to load polygons for '{}' from {:?}", key, path))?;
        polys.insert(key, table);
    }
    info!("Loaded polygons");

    let boundary = load_boundary(&inputs.ch_shape, config.plot_crs)
        .with_context(|| format!("Failed to load region boundary from {:?}", inputs.ch_shape))?;
    debug!(name = %boundary.name, "Loaded region boundary");

    Ok(Inputs {
        wind_speeds,
        polys,
        boundary,
    })
}

fn grid<'a>(wind_speeds: &'a BTreeMap<DatasetKey, GridArray>, key: DatasetKey) -> Result<&'a GridArray> {
    wind_speeds
        .get(&key)
        .with_context(|| format!("No wind speed loaded for '{}'", key))
}

fn table<'a>(
    polys: &'a mut BTreeMap<DatasetKey, GridCellTable>,
    key: DatasetKey,
) -> Result<&'a mut GridCellTable> {
    polys
        .get_mut(&key)
        .with_context(|| format!("No polygons loaded for '{}'", key))
}

/// Attach each dataset's temporal mean as column `ave_ws` and return the
/// range shared by all three maps.
pub fn per_gridcell_ws(
    wind_speeds: &BTreeMap<DatasetKey, GridArray>,
    polys: &mut BTreeMap<DatasetKey, GridCellTable>,
) -> Result<ValueRange> {
    let mut range = ValueRange::default();
    for key in DatasetKey::ALL {
        let mean = temporal_mean(grid(wind_speeds, key)?);
        let matched = table(polys, key)?.assign_field(AVE_WS, &mean);
        debug!(dataset = %key, matched, "Attached average wind speed");
        range = range.include(&mean);
    }
    if !range.is_set() {
        warn!("No finite average wind speed in any dataset");
    }
    Ok(range)
}

/// Correlate regridded COSMO-REA2 with NEWA over `period`, as column
/// `corr` of the regridded dataset's polygons.
pub fn per_gridcell_correlation(
    wind_speeds: &BTreeMap<DatasetKey, GridArray>,
    polys: &mut BTreeMap<DatasetKey, GridCellTable>,
    period: &YearRange,
) -> Result<()> {
    let (cosmo, newa) = align_for_correlation(
        grid(wind_speeds, DatasetKey::CosmoRea2GriddedToNewa)?,
        grid(wind_speeds, DatasetKey::Newa)?,
        period,
    )
    .context("Failed to align datasets for correlation")?;
    let corr = temporal_correlation(&cosmo, &newa)?;
    table(polys, DatasetKey::CosmoRea2GriddedToNewa)?.assign_field(CORR, &corr);
    Ok(())
}

/// National annual averages of COSMO-REA2 and NEWA.
pub fn annual_average_ws(
    wind_speeds: &BTreeMap<DatasetKey, GridArray>,
    polys: &BTreeMap<DatasetKey, GridCellTable>,
    boundary: &Boundary,
) -> Result<AnnualTable> {
    let region = boundary.prepare();
    let mut series = Vec::with_capacity(DatasetKey::TIMESERIES.len());

    for key in DatasetKey::TIMESERIES {
        let ws = grid(wind_speeds, key)?;
        let cells = polys
            .get(&key)
            .with_context(|| format!("No polygons loaded for '{}'", key))?;

        let [intersects, within] = Predicate::ALL.map(|predicate| {
            let flags = cells.predicate_mask(&region, predicate);
            cells.mask_on_grid(&flags, &ws.x, &ws.y)
        });
        series.push(national_annual_average(key, ws, &intersects, &within)?);
    }

    Ok(AnnualTable::from_series(&series))
}

/// Run every reduction step on loaded inputs.
pub fn compare(inputs: Inputs, config: &CompareConfig) -> Result<Comparison> {
    let Inputs {
        wind_speeds,
        mut polys,
        boundary,
    } = inputs;

    let ws_range = per_gridcell_ws(&wind_speeds, &mut polys)?;
    info!(min = ws_range.min, max = ws_range.max, "Loaded average wind speed");

    per_gridcell_correlation(&wind_speeds, &mut polys, &config.correlation_period)?;
    info!(
        start = config.correlation_period.start_year,
        end = config.correlation_period.end_year,
        "Loaded correlation"
    );

    let annual = annual_average_ws(&wind_speeds, &polys, &boundary)?;
    info!(rows = annual.rows.len(), "Loaded annual wind speed");

    Ok(Comparison {
        polys,
        ws_range,
        annual,
        boundary,
    })
}

/// Full run: returns the path of the written figure.
pub fn run(config: &CompareConfig) -> Result<PathBuf> {
    let inputs = load_inputs(config)?;
    let comparison = compare(inputs, config)?;
    let image = plot::render_figure(&comparison, config)?;

    if let Some(parent) = config.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {:?}", parent))?;
    }
    renderer::png::write_png(&image, &config.output)
        .with_context(|| format!("Failed to write figure to {:?}", config.output))?;
    info!(path = %config.output.display(), width = image.width(), height = image.height(), "Wrote figure");
    Ok(config.output.clone())
}
