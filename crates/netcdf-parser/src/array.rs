//! Reading a wind-speed "data array" into a [`GridArray`].
//!
//! A data array is a file holding a single data variable over a time axis
//! and two spatial axes, plus 1-D coordinate variables. Storage order of the
//! axes is arbitrary; the result is always `[time][y][x]`.

use std::path::Path;

use chrono::NaiveDateTime;
use tracing::{debug, info};
use wind_common::{DatasetConfig, GridArray};

use crate::cf_time::decode_times;
use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{dimension_names, get_f64_attr, get_str_attr, open};

/// Packing and missing-value attributes of a variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Packing {
    pub scale_factor: f64,
    pub add_offset: f64,
    pub fill_value: Option<f64>,
    pub missing_value: Option<f64>,
}

impl Default for Packing {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            add_offset: 0.0,
            fill_value: None,
            missing_value: None,
        }
    }
}

impl Packing {
    fn from_variable(var: &netcdf::Variable) -> Self {
        Self {
            scale_factor: get_f64_attr(var, "scale_factor").unwrap_or(1.0),
            add_offset: get_f64_attr(var, "add_offset").unwrap_or(0.0),
            fill_value: get_f64_attr(var, "_FillValue"),
            missing_value: get_f64_attr(var, "missing_value"),
        }
    }

    /// Raw stored value to physical value; fill/missing/NaN become NaN.
    ///
    /// Values are read at single precision, so the sentinels are compared
    /// after the same rounding.
    pub fn unpack(&self, raw: f32) -> f32 {
        let is_sentinel = |s: Option<f64>| s.is_some_and(|s| raw == s as f32);
        if raw.is_nan() || is_sentinel(self.fill_value) || is_sentinel(self.missing_value) {
            f32::NAN
        } else if self.is_identity() {
            raw
        } else {
            (f64::from(raw) * self.scale_factor + self.add_offset) as f32
        }
    }

    pub fn is_identity(&self) -> bool {
        self.scale_factor == 1.0 && self.add_offset == 0.0
    }
}

/// Read one dataset's wind speed array.
///
/// `name` labels the array in logs and errors (usually the dataset key).
pub fn read_grid_array<P: AsRef<Path>>(
    path: P,
    config: &DatasetConfig,
    name: &str,
) -> NetCdfResult<GridArray> {
    let path = path.as_ref();
    let file = open(path)?;

    let var = select_variable(&file, config)?;
    let dims = dimension_names(&var);
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    debug!(file = %path.display(), variable = %var.name(), dims = ?dims, shape = ?shape, "Selected data variable");

    let layout = AxisLayout::resolve(&dims, &shape, config)?;

    // Single precision halves the peak footprint of multi-year hourly
    // grids; f32 holds every short-packed and float-stored value exactly.
    let raw: Vec<f32> = var.get_values::<f32, _>(..)?;
    let packing = Packing::from_variable(&var);
    let values = layout.reorder(&raw, |v| packing.unpack(v));
    drop(raw);

    let times = read_times(&file, &config.time_name)?;
    if times.len() != layout.nt {
        return Err(NetCdfError::InvalidFormat(format!(
            "time coordinate has {} entries, dimension has {}",
            times.len(),
            layout.nt
        )));
    }
    let x = read_coordinate(&file, &config.x_name, layout.nx)?;
    let y = read_coordinate(&file, &config.y_name, layout.ny)?;

    info!(
        dataset = name,
        file = %path.display(),
        times = layout.nt,
        rows = layout.ny,
        cols = layout.nx,
        "Read wind speed array"
    );

    Ok(GridArray::new(
        name,
        config.x_name.clone(),
        config.y_name.clone(),
        times,
        x,
        y,
        values,
    )?)
}

fn select_variable<'f>(
    file: &'f netcdf::File,
    config: &DatasetConfig,
) -> NetCdfResult<netcdf::Variable<'f>> {
    if let Some(name) = &config.variable {
        return file
            .variable(name)
            .ok_or_else(|| NetCdfError::MissingData(format!("variable '{}'", name)));
    }

    let mut candidates: Vec<netcdf::Variable<'f>> = file
        .variables()
        .filter(|v| {
            let dims = dimension_names(v);
            let name = v.name();
            !dims.iter().any(|d| *d == name)
                && dims.iter().any(|d| *d == config.time_name)
                && dims.iter().any(|d| *d == config.x_name)
                && dims.iter().any(|d| *d == config.y_name)
        })
        .collect();

    match candidates.len() {
        0 => Err(NetCdfError::MissingData(format!(
            "variable over ({}, {}, {})",
            config.time_name, config.y_name, config.x_name
        ))),
        1 => Ok(candidates.remove(0)),
        _ => Err(NetCdfError::AmbiguousVariable(
            candidates.iter().map(|v| v.name()).collect(),
        )),
    }
}

/// Where the time, y and x axes sit in storage order.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisLayout {
    pub nt: usize,
    pub ny: usize,
    pub nx: usize,
    /// Source strides of the time, y and x axes
    strides: [usize; 3],
}

impl AxisLayout {
    /// Match storage dimensions to axes; extra dimensions must be length 1.
    pub fn resolve(dims: &[String], shape: &[usize], config: &DatasetConfig) -> NetCdfResult<Self> {
        let position = |name: &str| {
            dims.iter()
                .position(|d| d == name)
                .ok_or_else(|| NetCdfError::MissingData(format!("dimension '{}'", name)))
        };
        let t_pos = position(&config.time_name)?;
        let y_pos = position(&config.y_name)?;
        let x_pos = position(&config.x_name)?;

        for (i, (dim, len)) in dims.iter().zip(shape).enumerate() {
            if i != t_pos && i != y_pos && i != x_pos && *len != 1 {
                return Err(NetCdfError::InvalidFormat(format!(
                    "extra dimension '{}' has length {}, expected 1",
                    dim, len
                )));
            }
        }

        // Row-major strides of the storage layout
        let mut source_strides = vec![1usize; shape.len()];
        for i in (0..shape.len().saturating_sub(1)).rev() {
            source_strides[i] = source_strides[i + 1] * shape[i + 1];
        }

        Ok(Self {
            nt: shape[t_pos],
            ny: shape[y_pos],
            nx: shape[x_pos],
            strides: [source_strides[t_pos], source_strides[y_pos], source_strides[x_pos]],
        })
    }

    /// Gather storage-ordered values into `[time][y][x]`.
    pub fn reorder<T, F>(&self, raw: &[T], convert: F) -> Vec<f32>
    where
        T: Copy,
        F: Fn(T) -> f32,
    {
        let [st, sy, sx] = self.strides;
        let mut out = Vec::with_capacity(self.nt * self.ny * self.nx);
        for t in 0..self.nt {
            for y in 0..self.ny {
                let row = t * st + y * sy;
                for x in 0..self.nx {
                    out.push(convert(raw[row + x * sx]));
                }
            }
        }
        out
    }
}

fn read_times(file: &netcdf::File, time_name: &str) -> NetCdfResult<Vec<NaiveDateTime>> {
    let var = file
        .variable(time_name)
        .ok_or_else(|| NetCdfError::MissingData(format!("time coordinate '{}'", time_name)))?;
    let units = get_str_attr(&var, "units")
        .ok_or_else(|| NetCdfError::MissingData(format!("units of '{}'", time_name)))?;
    let values: Vec<f64> = var.get_values::<f64, _>(..)?;
    decode_times(&values, &units)
}

/// 1-D coordinate labels, or positional indices when the file has none.
fn read_coordinate(file: &netcdf::File, name: &str, len: usize) -> NetCdfResult<Vec<f64>> {
    match file.variable(name) {
        Some(var) if var.dimensions().len() == 1 => {
            let values: Vec<f64> = var.get_values::<f64, _>(..)?;
            if values.len() != len {
                return Err(NetCdfError::InvalidFormat(format!(
                    "coordinate '{}' has {} labels for {} cells",
                    name,
                    values.len(),
                    len
                )));
            }
            Ok(values)
        }
        _ => {
            debug!(coordinate = name, "No 1-D coordinate variable, using positional labels");
            Ok((0..len).map(|i| i as f64).collect())
        }
    }
}
