//! Grid-cell polygon tables and the study-region boundary.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, warn};
use wind_common::{BoundingBox, CellField, CoordIndex, CrsCode, DatasetConfig};

use crate::error::{GeometryError, GeometryResult};
use crate::geojson::property_f64;
use crate::polygon::{MultiPolygon, Predicate};
use crate::prepared::PreparedRegion;
use crate::source::read_features;

/// Properties naming a region, most specific first. `NAME_0` is the
/// country name in GADM layers.
const NAME_PROPERTIES: [&str; 4] = ["name", "NAME", "NAME_0", "COUNTRY"];

/// One grid cell: its coordinate labels and footprint.
#[derive(Debug, Clone)]
pub struct GridCell {
    pub x: f64,
    pub y: f64,
    pub geometry: MultiPolygon,
}

/// Cell polygons of one dataset, with attribute columns for plotting.
#[derive(Debug, Clone)]
pub struct GridCellTable {
    pub x_name: String,
    pub y_name: String,
    pub crs: CrsCode,
    cells: Vec<GridCell>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl GridCellTable {
    pub fn new(x_name: &str, y_name: &str, crs: CrsCode, cells: Vec<GridCell>) -> Self {
        Self {
            x_name: x_name.to_string(),
            y_name: y_name.to_string(),
            crs,
            cells,
            columns: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// Attach a per-cell field as column `name`.
    ///
    /// Cells whose labels are not on the field's grid get NaN. Returns the
    /// number of cells that matched.
    pub fn assign_field(&mut self, name: &str, field: &CellField) -> usize {
        let x_index = CoordIndex::new(&field.x);
        let y_index = CoordIndex::new(&field.y);

        let column: Vec<f64> = self
            .cells
            .iter()
            .map(|c| field.lookup(&x_index, &y_index, c.x, c.y).unwrap_or(f64::NAN))
            .collect();

        let matched = self
            .cells
            .iter()
            .filter(|c| x_index.find(c.x).is_some() && y_index.find(c.y).is_some())
            .count();
        if matched < self.cells.len() {
            warn!(
                column = name,
                unmatched = self.cells.len() - matched,
                "Grid cells without a matching grid coordinate"
            );
        }

        self.columns.insert(name.to_string(), column);
        matched
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Union of all cell bounding boxes.
    pub fn total_bounds(&self) -> Option<BoundingBox> {
        self.cells
            .iter()
            .filter_map(|c| c.geometry.bbox())
            .reduce(|a, b| a.union(&b))
    }

    /// Evaluate `predicate` for every cell against a prepared region.
    pub fn predicate_mask(&self, region: &PreparedRegion, predicate: Predicate) -> Vec<bool> {
        self.cells
            .iter()
            .map(|c| match predicate {
                Predicate::Intersects => region.is_intersected_by(&c.geometry),
                Predicate::Within => region.contains_geometry(&c.geometry),
            })
            .collect()
    }

    /// Scatter per-cell flags onto a `[y][x]` grid.
    ///
    /// Grid positions without a polygon stay `false`.
    pub fn mask_on_grid(&self, flags: &[bool], x: &[f64], y: &[f64]) -> Vec<bool> {
        let x_index = CoordIndex::new(x);
        let y_index = CoordIndex::new(y);
        let mut mask = vec![false; x.len() * y.len()];
        let mut unmatched = 0usize;

        for (cell, &flag) in self.cells.iter().zip(flags) {
            match (x_index.find(cell.x), y_index.find(cell.y)) {
                (Some(ix), Some(iy)) => mask[iy * x.len() + ix] = flag,
                _ => unmatched += 1,
            }
        }

        if unmatched > 0 {
            warn!(unmatched, "Mask cells outside the data grid were dropped");
        }
        mask
    }
}

/// Load a dataset's grid-cell polygons, reprojected to `plot_crs`.
///
/// Every feature must carry the dataset's x and y coordinate names as
/// properties.
pub fn load_grid_cells<P: AsRef<Path>>(
    path: P,
    config: &DatasetConfig,
    plot_crs: CrsCode,
) -> GeometryResult<GridCellTable> {
    let path = path.as_ref();
    let source = read_features(path)?.reproject(plot_crs)?;
    if source.features.is_empty() {
        return Err(GeometryError::NoGeometry(path.display().to_string()));
    }

    let cells = source
        .features
        .into_iter()
        .map(|f| {
            let coord = |name: &str| {
                property_f64(&f.properties, name).ok_or_else(|| GeometryError::MissingProperty {
                    index: f.index,
                    property: name.to_string(),
                })
            };
            Ok(GridCell {
                x: coord(&config.x_name)?,
                y: coord(&config.y_name)?,
                geometry: f.geometry,
            })
        })
        .collect::<GeometryResult<Vec<_>>>()?;

    debug!(path = %path.display(), cells = cells.len(), "Read grid-cell polygons");
    Ok(GridCellTable::new(
        &config.x_name,
        &config.y_name,
        plot_crs,
        cells,
    ))
}

/// Outline of the study region.
#[derive(Debug, Clone)]
pub struct Boundary {
    pub name: String,
    pub geometry: MultiPolygon,
}

impl Boundary {
    pub fn total_bounds(&self) -> Option<BoundingBox> {
        self.geometry.bbox()
    }

    pub fn prepare(&self) -> PreparedRegion {
        PreparedRegion::new(&self.geometry)
    }
}

/// Load the study-region boundary: the first areal feature of the source.
///
/// `path` may name an archive member, see [`crate::source`].
pub fn load_boundary<P: AsRef<Path>>(path: P, plot_crs: CrsCode) -> GeometryResult<Boundary> {
    let path = path.as_ref();
    let source = read_features(path)?.reproject(plot_crs)?;
    let feature = source
        .features
        .into_iter()
        .next()
        .ok_or_else(|| GeometryError::NoGeometry(path.display().to_string()))?;

    let name = NAME_PROPERTIES
        .iter()
        .find_map(|key| feature.properties.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
        .unwrap_or_else(|| format!("feature {}", feature.index));

    if let Some(bbox) = feature.geometry.bbox() {
        if !plot_crs.valid_bounds().contains_bbox(&bbox) {
            warn!(
                name = %name,
                crs = %plot_crs,
                "Region boundary extends beyond the area of use of the plot CRS"
            );
        }
    }

    Ok(Boundary {
        name,
        geometry: feature.geometry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::Polygon;

    fn unit_cells() -> GridCellTable {
        let cells = (0..3)
            .flat_map(|iy| {
                (0..3).map(move |ix| GridCell {
                    x: ix as f64,
                    y: iy as f64,
                    geometry: Polygon::rectangle(
                        ix as f64 - 0.5,
                        iy as f64 - 0.5,
                        ix as f64 + 0.5,
                        iy as f64 + 0.5,
                    )
                    .into(),
                })
            })
            .collect();
        GridCellTable::new("x", "y", CrsCode::Epsg4326, cells)
    }

    #[test]
    fn test_assign_field_by_label() {
        let mut table = unit_cells();
        let field = CellField {
            x: vec![0.0, 1.0, 2.0],
            y: vec![0.0, 1.0],
            values: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        };
        let matched = table.assign_field("ave_ws", &field);
        assert_eq!(matched, 6);

        let column = table.column("ave_ws").unwrap();
        assert_eq!(&column[..6], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert!(column[6..].iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_predicate_masks() {
        let table = unit_cells();
        let region = PreparedRegion::new(&Polygon::rectangle(-0.5, -0.5, 1.2, 1.2).into());

        let intersects = table.predicate_mask(&region, Predicate::Intersects);
        let within = table.predicate_mask(&region, Predicate::Within);

        assert_eq!(intersects.iter().filter(|&&f| f).count(), 4);
        // Only the lower-left cell lies fully inside.
        assert_eq!(within, vec![true, false, false, false, false, false, false, false, false]);
    }

    #[test]
    fn test_mask_on_grid_transposes_cells() {
        let table = unit_cells();
        let flags: Vec<bool> = (0..9).map(|i| i % 4 == 0).collect();
        let mask = table.mask_on_grid(&flags, &[2.0, 1.0, 0.0], &[0.0, 1.0, 2.0]);
        // Cell (x=0, y=0) lands at column 2 of a reversed x axis.
        assert!(mask[2]);
        assert!(mask[3 + 1]);
        assert!(mask[6]);
        assert_eq!(mask.iter().filter(|&&f| f).count(), 3);
    }

    #[test]
    fn test_total_bounds() {
        let bounds = unit_cells().total_bounds().unwrap();
        assert_eq!(bounds, BoundingBox::new(-0.5, -0.5, 2.5, 2.5));
    }
}
