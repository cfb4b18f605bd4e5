//! Error types shared by the comparison crates.

use thiserror::Error;

/// Result type alias using WindError.
pub type WindResult<T> = Result<T, WindError>;

/// Errors raised while validating arrays and dataset configuration.
#[derive(Debug, Error)]
pub enum WindError {
    #[error("Dataset not configured: {0}")]
    DatasetNotConfigured(String),

    #[error("Unknown dataset key: {0}")]
    UnknownDataset(String),

    #[error("Array shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid CRS: {0}")]
    InvalidCrs(String),

    #[error("Invalid year range: {start}..={end}")]
    InvalidYearRange { start: i32, end: i32 },
}

impl From<crate::crs::CrsParseError> for WindError {
    fn from(err: crate::crs::CrsParseError) -> Self {
        WindError::InvalidCrs(err.to_string())
    }
}
