//! Error types for figure rendering.

use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid canvas size {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },

    #[error("Unknown colormap: {0}")]
    UnknownColormap(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    #[error("Chart rendering failed: {0}")]
    Chart(String),

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error("Style file {path}: {message}")]
    Style { path: String, message: String },

    #[error("I/O error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
