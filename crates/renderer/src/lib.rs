//! Static figure rendering.
//!
//! Implements the pieces a comparison figure is built from:
//! - Colormaps and normalisation
//! - Grid-spec layout and map panels with a fixed aspect
//! - Horizontal colorbars
//! - Categorical line charts, drawn with `plotters`
//! - Text via TrueType fonts
//! - PNG encoding

pub mod canvas;
pub mod chart;
pub mod colorbar;
pub mod colormap;
pub mod error;
pub mod layout;
pub mod map;
pub mod png;
pub mod style;
pub mod text;
pub mod ticks;

pub use canvas::{crop_to_content, Canvas};
pub use chart::{LineChart, Series};
pub use colorbar::{draw_horizontal_colorbar, ColorbarLayout};
pub use colormap::{Color, Colormap, Normalize, ScalarMappable};
pub use error::{RenderError, RenderResult};
pub use layout::{FigureScale, GridSpec, Margins, Rect};
pub use map::MapFrame;
pub use text::{FontBook, FontFace, FontPaths, HAlign, TextItem, VAlign};
