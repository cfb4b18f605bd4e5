//! Planar polygon model and spatial predicates.
//!
//! Coordinates are `(x, y)` pairs in a projected or geographic CRS. Rings
//! are stored open (the closing vertex is dropped on construction) and
//! point location uses the even-odd rule, so hole orientation does not
//! matter.

use serde::{Deserialize, Serialize};
use wind_common::BoundingBox;

use crate::prepared::PreparedRegion;

pub type Coord = (f64, f64);

/// Result of locating a point against an areal geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Inside,
    Boundary,
    Outside,
}

/// Spatial predicate used to select grid cells against a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Predicate {
    /// Cell and region share at least one point
    Intersects,
    /// Cell lies entirely inside the region (boundary contact allowed)
    Within,
}

impl Predicate {
    pub const ALL: [Predicate; 2] = [Predicate::Intersects, Predicate::Within];

    pub fn as_str(&self) -> &'static str {
        match self {
            Predicate::Intersects => "intersects",
            Predicate::Within => "within",
        }
    }
}

/// A closed linear ring.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    points: Vec<Coord>,
}

impl Ring {
    pub fn new(mut points: Vec<Coord>) -> Self {
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        Self { points }
    }

    pub fn points(&self) -> &[Coord] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Edges including the closing edge.
    pub fn segments(&self) -> impl Iterator<Item = (Coord, Coord)> + '_ {
        let n = self.points.len();
        let count = if n < 2 { 0 } else { n };
        (0..count).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.points.iter().copied())
    }

    /// Shoelace area, positive for counter-clockwise rings.
    pub fn signed_area(&self) -> f64 {
        self.segments()
            .map(|(a, b)| a.0 * b.1 - b.0 * a.1)
            .sum::<f64>()
            / 2.0
    }

    /// Even-odd point location against this ring alone.
    pub fn locate(&self, p: Coord) -> Location {
        let mut inside = false;
        for (a, b) in self.segments() {
            if point_on_segment(a, b, p) {
                return Location::Boundary;
            }
            if ray_crosses(a, b, p) {
                inside = !inside;
            }
        }
        if inside {
            Location::Inside
        } else {
            Location::Outside
        }
    }

    /// Apply a fallible coordinate mapping to every vertex.
    pub fn try_map<F, E>(&self, f: &mut F) -> Result<Ring, E>
    where
        F: FnMut(f64, f64) -> Result<Coord, E>,
    {
        let points = self
            .points
            .iter()
            .map(|&(x, y)| f(x, y))
            .collect::<Result<Vec<_>, E>>()?;
        Ok(Ring { points })
    }
}

/// A polygon with optional holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub exterior: Ring,
    pub interiors: Vec<Ring>,
}

impl Polygon {
    pub fn new(exterior: Ring, interiors: Vec<Ring>) -> Self {
        Self {
            exterior,
            interiors,
        }
    }

    /// Axis-aligned rectangle, handy for regular grid cells.
    pub fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(
            Ring::new(vec![
                (min_x, min_y),
                (max_x, min_y),
                (max_x, max_y),
                (min_x, max_y),
            ]),
            Vec::new(),
        )
    }

    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        std::iter::once(&self.exterior).chain(self.interiors.iter())
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        self.exterior.bbox()
    }

    /// Area of the exterior minus holes.
    pub fn area(&self) -> f64 {
        self.exterior.signed_area().abs()
            - self
                .interiors
                .iter()
                .map(|r| r.signed_area().abs())
                .sum::<f64>()
    }

    pub fn locate(&self, p: Coord) -> Location {
        match self.exterior.locate(p) {
            Location::Inside => {
                for hole in &self.interiors {
                    match hole.locate(p) {
                        Location::Inside => return Location::Outside,
                        Location::Boundary => return Location::Boundary,
                        Location::Outside => {}
                    }
                }
                Location::Inside
            }
            other => other,
        }
    }
}

/// One or more polygons treated as a single areal geometry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiPolygon(pub Vec<Polygon>);

impl MultiPolygon {
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self(polygons)
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|p| p.exterior.is_empty())
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        self.0
            .iter()
            .filter_map(Polygon::bbox)
            .reduce(|a, b| a.union(&b))
    }

    pub fn area(&self) -> f64 {
        self.0.iter().map(Polygon::area).sum()
    }

    /// All rings of all polygons.
    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        self.0.iter().flat_map(Polygon::rings)
    }

    pub fn vertices(&self) -> impl Iterator<Item = Coord> + '_ {
        self.rings().flat_map(|r| r.points().iter().copied())
    }

    pub fn segments(&self) -> impl Iterator<Item = (Coord, Coord)> + '_ {
        self.rings().flat_map(Ring::segments)
    }

    pub fn locate(&self, p: Coord) -> Location {
        let mut on_boundary = false;
        for polygon in &self.0 {
            match polygon.locate(p) {
                Location::Inside => return Location::Inside,
                Location::Boundary => on_boundary = true,
                Location::Outside => {}
            }
        }
        if on_boundary {
            Location::Boundary
        } else {
            Location::Outside
        }
    }

    /// Strict interior containment of a point.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.locate((x, y)) == Location::Inside
    }

    /// True if the geometries share at least one point.
    pub fn intersects(&self, other: &MultiPolygon) -> bool {
        PreparedRegion::new(other).is_intersected_by(self)
    }

    /// True if no point of `self` lies outside `other`.
    pub fn within(&self, other: &MultiPolygon) -> bool {
        PreparedRegion::new(other).contains_geometry(self)
    }

    pub fn try_map<F, E>(&self, mut f: F) -> Result<MultiPolygon, E>
    where
        F: FnMut(f64, f64) -> Result<Coord, E>,
    {
        let polygons = self
            .0
            .iter()
            .map(|p| {
                Ok(Polygon {
                    exterior: p.exterior.try_map(&mut f)?,
                    interiors: p
                        .interiors
                        .iter()
                        .map(|r| r.try_map(&mut f))
                        .collect::<Result<Vec<_>, E>>()?,
                })
            })
            .collect::<Result<Vec<_>, E>>()?;
        Ok(MultiPolygon(polygons))
    }
}

impl From<Polygon> for MultiPolygon {
    fn from(polygon: Polygon) -> Self {
        MultiPolygon(vec![polygon])
    }
}

// =============================================================================
// Segment primitives
// =============================================================================

/// Sign of the turn a → b → c: 1 left, -1 right, 0 collinear.
pub(crate) fn orientation(a: Coord, b: Coord, c: Coord) -> i8 {
    let cross = (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0);
    let scale = ((b.0 - a.0).abs() + (b.1 - a.1).abs()) * ((c.0 - a.0).abs() + (c.1 - a.1).abs());
    if cross.abs() <= scale * 1e-12 {
        0
    } else if cross > 0.0 {
        1
    } else {
        -1
    }
}

pub(crate) fn point_on_segment(a: Coord, b: Coord, p: Coord) -> bool {
    orientation(a, b, p) == 0
        && p.0 >= a.0.min(b.0)
        && p.0 <= a.0.max(b.0)
        && p.1 >= a.1.min(b.1)
        && p.1 <= a.1.max(b.1)
}

/// Whether a ray from `p` towards +x crosses edge a-b (half-open in y).
pub(crate) fn ray_crosses(a: Coord, b: Coord, p: Coord) -> bool {
    if (a.1 > p.1) == (b.1 > p.1) {
        return false;
    }
    let x_at = a.0 + (p.1 - a.1) * (b.0 - a.0) / (b.1 - a.1);
    p.0 < x_at
}

/// Segments share at least one point.
pub(crate) fn segments_touch(p1: Coord, p2: Coord, q1: Coord, q2: Coord) -> bool {
    segments_cross(p1, p2, q1, q2)
        || point_on_segment(q1, q2, p1)
        || point_on_segment(q1, q2, p2)
        || point_on_segment(p1, p2, q1)
        || point_on_segment(p1, p2, q2)
}

/// Segments cross at a single interior point of both.
pub(crate) fn segments_cross(p1: Coord, p2: Coord, q1: Coord, q2: Coord) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);
    d1 * d2 < 0 && d3 * d4 < 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_with_hole() -> Polygon {
        Polygon::new(
            Ring::new(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]),
            vec![Ring::new(vec![(4.0, 4.0), (6.0, 4.0), (6.0, 6.0), (4.0, 6.0)])],
        )
    }

    #[test]
    fn test_ring_drops_closing_point() {
        let ring = Ring::new(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.segments().count(), 3);
    }

    #[test]
    fn test_locate_with_hole() {
        let polygon = square_with_hole();
        assert_eq!(polygon.locate((1.0, 1.0)), Location::Inside);
        assert_eq!(polygon.locate((5.0, 5.0)), Location::Outside);
        assert_eq!(polygon.locate((4.0, 5.0)), Location::Boundary);
        assert_eq!(polygon.locate((0.0, 5.0)), Location::Boundary);
        assert_eq!(polygon.locate((11.0, 5.0)), Location::Outside);
    }

    #[test]
    fn test_area() {
        assert!((square_with_hole().area() - 96.0).abs() < 1e-12);
    }

    #[test]
    fn test_segment_primitives() {
        assert!(segments_cross((0.0, 0.0), (2.0, 2.0), (0.0, 2.0), (2.0, 0.0)));
        // T-junction touches but does not cross
        assert!(!segments_cross((0.0, 0.0), (2.0, 0.0), (1.0, 0.0), (1.0, 1.0)));
        assert!(segments_touch((0.0, 0.0), (2.0, 0.0), (1.0, 0.0), (1.0, 1.0)));
        assert!(!segments_touch((0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)));
    }
}
