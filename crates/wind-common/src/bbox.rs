//! Axis-aligned extents in plot coordinates.

use serde::{Deserialize, Serialize};

/// Extent of a geometry or map view.
///
/// Units follow the CRS: degrees for EPSG:4326, metres for the projected
/// grids.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Extent of `points`, or `None` when there are none.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut points = points.into_iter();
        let (x0, y0) = points.next()?;
        Some(points.fold(Self::new(x0, y0, x0, y0), |b, (x, y)| Self {
            min_x: b.min_x.min(x),
            min_y: b.min_y.min(y),
            max_x: b.max_x.max(x),
            max_y: b.max_y.max(y),
        }))
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        Self::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Overlapping part of two extents. Boxes that only share an edge
    /// overlap in a degenerate box.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let overlap = Self::new(
            self.min_x.max(other.min_x),
            self.min_y.max(other.min_y),
            self.max_x.min(other.max_x),
            self.max_y.min(other.max_y),
        );
        (overlap.min_x <= overlap.max_x && overlap.min_y <= overlap.max_y).then_some(overlap)
    }

    pub fn contains_bbox(&self, other: &BoundingBox) -> bool {
        self.contains_point(other.min_x, other.min_y) && self.contains_point(other.max_x, other.max_y)
    }

    /// Edges count as inside.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    /// Map view limits: minima scaled by `1 - margin`, maxima by `1 + margin`.
    ///
    /// The pad is multiplicative, so it only widens the box for positive
    /// coordinates (Swiss grids, northern and eastern degrees).
    pub fn scaled_limits(&self, margin: f64) -> BoundingBox {
        Self::new(
            self.min_x * (1.0 - margin),
            self.min_y * (1.0 - margin),
            self.max_x * (1.0 + margin),
            self.max_y * (1.0 + margin),
        )
    }
}
