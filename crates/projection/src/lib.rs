//! Coordinate reference system transformations.
//!
//! Implements the handful of map projections needed for Swiss study areas
//! from scratch without external dependencies. Every CRS converts through
//! WGS84 geographic coordinates.

pub mod error;
pub mod mercator;
pub mod swiss;
pub mod transform;

pub use error::{ProjectionError, ProjectionResult};
pub use mercator::WebMercator;
pub use swiss::{SwissGrid, SwissGridVariant};
pub use transform::{Projection, Transformer};
