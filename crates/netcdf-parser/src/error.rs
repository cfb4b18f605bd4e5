//! Errors raised while reading wind-speed NetCDF files.

use std::path::PathBuf;

use thiserror::Error;

pub type NetCdfResult<T> = Result<T, NetCdfError>;

#[derive(Error, Debug)]
pub enum NetCdfError {
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: netcdf::Error,
    },

    #[error("NetCDF library error: {0}")]
    Library(#[from] netcdf::Error),

    /// A variable, dimension or attribute the reader needs is absent
    #[error("Missing required data: {0}")]
    MissingData(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Several candidate data variables and none configured
    #[error("Cannot choose a data variable, candidates: {0:?}")]
    AmbiguousVariable(Vec<String>),

    /// A time offset that maps to no representable timestamp
    #[error("Time offset {0} is outside the supported date range")]
    InvalidTime(f64),

    #[error("Unsupported time units: '{0}'")]
    UnsupportedTimeUnits(String),

    #[error(transparent)]
    Grid(#[from] wind_common::WindError),
}
