//! Error types for grid reductions.

use thiserror::Error;
use wind_common::WindError;

pub type StatsResult<T> = Result<T, StatsError>;

#[derive(Error, Debug)]
pub enum StatsError {
    /// Two inputs that must line up do not.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Nothing left after restricting to a period.
    #[error("no time steps of '{name}' fall in {start}-{end}")]
    EmptyPeriod { name: String, start: i32, end: i32 },

    #[error(transparent)]
    Grid(#[from] WindError),
}
