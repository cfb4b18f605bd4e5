//! Error types for geometry loading.

use thiserror::Error;

pub type GeometryResult<T> = Result<T, GeometryError>;

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid GeoJSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot read zip archive {path}: {source}")]
    Archive {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Archive {archive} has no member '{member}'")]
    MissingMember { archive: String, member: String },

    #[error("Invalid shapefile {path}: {message}")]
    Shapefile { path: String, message: String },

    #[error("Cannot read GeoPackage {path}: {source}")]
    GeoPackage {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Malformed GeoPackage geometry blob or WKB
    #[error("Invalid geometry in {path}: {message}")]
    InvalidGeometry { path: String, message: String },

    #[error("Unrecognised vector format: {0}")]
    UnsupportedFormat(String),

    #[error("Feature {index} has no usable '{property}' property")]
    MissingProperty { index: usize, property: String },

    #[error("No polygon geometry found in {0}")]
    NoGeometry(String),

    #[error("Unsupported CRS in {path}: {name}")]
    UnsupportedCrs { path: String, name: String },

    #[error("Reprojection failed: {0}")]
    Projection(#[from] projection::ProjectionError),
}
