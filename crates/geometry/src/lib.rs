//! Polygon geometry for gridded datasets.
//!
//! - [`polygon`]: rings, polygons with holes, point location and the
//!   `intersects` / `within` predicates
//! - [`geojson`]: GeoJSON parsing and reprojection into the plot CRS
//! - [`source`]: opening plain files and zip archive members; shapefiles
//!   ([`shp`]) and GeoPackages ([`gpkg`]) are read alongside GeoJSON
//! - [`cells`]: per-dataset tables of grid-cell polygons keyed by grid
//!   coordinates, with attribute columns for plotting

pub mod cells;
pub mod error;
pub mod geojson;
pub mod gpkg;
pub mod polygon;
pub mod prepared;
pub mod shp;
pub mod source;

pub use cells::{load_boundary, load_grid_cells, Boundary, GridCell, GridCellTable};
pub use error::{GeometryError, GeometryResult};
pub use polygon::{Location, MultiPolygon, Polygon, Predicate, Ring};
pub use prepared::PreparedRegion;
pub use source::{read_features, SourceLocation, VectorFormat};
