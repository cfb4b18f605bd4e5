//! Common types shared across the wind-speed comparison workspace.

pub mod bbox;
pub mod crs;
pub mod dataset;
pub mod error;
pub mod grid;
pub mod time;

pub use bbox::BoundingBox;
pub use crs::CrsCode;
pub use dataset::{DatasetConfig, DatasetKey};
pub use error::{WindError, WindResult};
pub use grid::{CellField, CoordIndex, GridArray};
pub use time::YearRange;
