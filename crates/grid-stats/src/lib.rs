//! Reductions of wind-speed cubes.
//!
//! - [`mean`]: per-gridcell temporal mean
//! - [`range`]: colour range shared across several fields
//! - [`correlation`]: per-gridcell temporal correlation between two datasets
//! - [`annual`]: per-year averages over a masked set of cells
//!
//! Every per-cell reduction skips missing (NaN) samples and yields NaN for
//! cells with nothing left to reduce.

pub mod annual;
pub mod correlation;
pub mod error;
pub mod mean;
pub mod range;

pub use annual::{annual_masked_mean, national_annual_average, AnnualPoint, AnnualSeries, AnnualTable};
pub use correlation::{align_for_correlation, temporal_correlation};
pub use error::{StatsError, StatsResult};
pub use mean::temporal_mean;
pub use range::ValueRange;
