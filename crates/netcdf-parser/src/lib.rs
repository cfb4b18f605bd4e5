//! NetCDF reader for gridded wind-speed reanalysis arrays.
//!
//! Reads a single-variable NetCDF file (the layout xarray writes for a
//! `DataArray`) into a [`wind_common::GridArray`]:
//!
//! - axes are located by the dataset's configured dimension names and
//!   reordered to `[time][y][x]`, whatever the storage order;
//! - `_FillValue` / `missing_value` become NaN and `scale_factor` /
//!   `add_offset` packing is undone;
//! - CF time coordinates (`"hours since 1995-01-01"`) are decoded.

pub mod array;
pub mod cf_time;
pub mod error;
pub mod native;

pub use array::{read_grid_array, AxisLayout, Packing};
pub use cf_time::{decode_times, TimeUnits};
pub use error::{NetCdfError, NetCdfResult};
pub use native::silence_hdf5_errors;
