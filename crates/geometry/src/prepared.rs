//! Spatially indexed region for repeated predicate evaluation.
//!
//! A national outline can carry tens of thousands of vertices while it is
//! tested against every grid cell. The region's edges are bucketed on a
//! regular grid so each cell only inspects edges near its own bounding box,
//! and point location only walks the edges of one horizontal band.

use wind_common::BoundingBox;

use crate::polygon::{
    point_on_segment, ray_crosses, segments_cross, segments_touch, Coord, Location, MultiPolygon,
};

/// Upper bound on buckets per axis.
const MAX_BUCKETS_PER_AXIS: usize = 256;

pub struct PreparedRegion {
    bbox: Option<BoundingBox>,
    segments: Vec<(Coord, Coord)>,
    cols: usize,
    rows: usize,
    cell_w: f64,
    cell_h: f64,
    /// Edge ids per `(row, col)` bucket
    buckets: Vec<Vec<u32>>,
    /// Edge ids per horizontal band
    bands: Vec<Vec<u32>>,
}

impl PreparedRegion {
    pub fn new(region: &MultiPolygon) -> Self {
        let segments: Vec<(Coord, Coord)> = region.segments().collect();
        let bbox = region.bbox();

        let per_axis = ((segments.len() as f64).sqrt() / 2.0).ceil() as usize;
        let per_axis = per_axis.clamp(1, MAX_BUCKETS_PER_AXIS);
        let (cols, rows) = (per_axis, per_axis);

        let (cell_w, cell_h) = match bbox {
            Some(b) => (
                (b.width() / cols as f64).max(f64::MIN_POSITIVE),
                (b.height() / rows as f64).max(f64::MIN_POSITIVE),
            ),
            None => (1.0, 1.0),
        };

        let mut prepared = Self {
            bbox,
            segments,
            cols,
            rows,
            cell_w,
            cell_h,
            buckets: vec![Vec::new(); cols * rows],
            bands: vec![Vec::new(); rows],
        };

        for (id, &(a, b)) in prepared.segments.iter().enumerate() {
            let (c0, c1) = prepared.col_range(a.0.min(b.0), a.0.max(b.0));
            let (r0, r1) = prepared.row_range(a.1.min(b.1), a.1.max(b.1));
            for r in r0..=r1 {
                prepared.bands[r].push(id as u32);
                for c in c0..=c1 {
                    prepared.buckets[r * cols + c].push(id as u32);
                }
            }
        }

        prepared
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        self.bbox
    }

    fn col_of(&self, x: f64) -> usize {
        let min_x = self.bbox.map_or(0.0, |b| b.min_x);
        let c = ((x - min_x) / self.cell_w).floor();
        (c.max(0.0) as usize).min(self.cols - 1)
    }

    fn row_of(&self, y: f64) -> usize {
        let min_y = self.bbox.map_or(0.0, |b| b.min_y);
        let r = ((y - min_y) / self.cell_h).floor();
        (r.max(0.0) as usize).min(self.rows - 1)
    }

    fn col_range(&self, min_x: f64, max_x: f64) -> (usize, usize) {
        (self.col_of(min_x), self.col_of(max_x))
    }

    fn row_range(&self, min_y: f64, max_y: f64) -> (usize, usize) {
        (self.row_of(min_y), self.row_of(max_y))
    }

    /// Edge ids whose buckets overlap `query`.
    fn candidates(&self, query: &BoundingBox) -> Vec<u32> {
        let Some(bbox) = self.bbox else {
            return Vec::new();
        };
        let Some(window) = bbox.intersection(query) else {
            return Vec::new();
        };
        let (c0, c1) = self.col_range(window.min_x, window.max_x);
        let (r0, r1) = self.row_range(window.min_y, window.max_y);

        let mut ids = Vec::new();
        for r in r0..=r1 {
            for c in c0..=c1 {
                ids.extend_from_slice(&self.buckets[r * self.cols + c]);
            }
        }
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Even-odd location of a point against the whole region.
    pub fn locate(&self, p: Coord) -> Location {
        match self.bbox {
            Some(b) if b.contains_point(p.0, p.1) => {}
            _ => return Location::Outside,
        }

        let mut inside = false;
        for &id in &self.bands[self.row_of(p.1)] {
            let (a, b) = self.segments[id as usize];
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

    /// `geometry.intersects(region)`
    pub fn is_intersected_by(&self, geometry: &MultiPolygon) -> bool {
        let (Some(region_bbox), Some(geom_bbox)) = (self.bbox, geometry.bbox()) else {
            return false;
        };
        if region_bbox.intersection(&geom_bbox).is_none() {
            return false;
        }

        let candidates = self.candidates(&geom_bbox);
        for (a, b) in geometry.segments() {
            for &id in &candidates {
                let (c, d) = self.segments[id as usize];
                if segments_touch(a, b, c, d) {
                    return true;
                }
            }
        }

        // No shared edge point: one must contain the other, or they are disjoint
        let geom_inside = geometry
            .polygons()
            .iter()
            .filter_map(|p| p.exterior.points().first())
            .any(|&v| self.locate(v) != Location::Outside);
        if geom_inside {
            return true;
        }
        candidates
            .iter()
            .any(|&id| geometry.locate(self.segments[id as usize].0) != Location::Outside)
    }

    /// `geometry.within(region)`
    pub fn contains_geometry(&self, geometry: &MultiPolygon) -> bool {
        let (Some(region_bbox), Some(geom_bbox)) = (self.bbox, geometry.bbox()) else {
            return false;
        };
        if !region_bbox.contains_bbox(&geom_bbox) {
            return false;
        }

        if geometry
            .vertices()
            .any(|v| self.locate(v) == Location::Outside)
        {
            return false;
        }

        let candidates = self.candidates(&geom_bbox);
        for (a, b) in geometry.segments() {
            let mid = ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);
            if self.locate(mid) == Location::Outside {
                return false;
            }
            for &id in &candidates {
                let (c, d) = self.segments[id as usize];
                if segments_cross(a, b, c, d) {
                    return false;
                }
            }
        }

        // A region edge passing through the geometry's interior leaves part
        // of the geometry outside
        !candidates
            .iter()
            .any(|&id| geometry.locate(self.segments[id as usize].0) == Location::Inside)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::{Polygon, Ring};

    /// An L-shaped region: 10x10 square with the top-right 5x5 quadrant cut out.
    fn l_shape() -> MultiPolygon {
        Polygon::new(
            Ring::new(vec![
                (0.0, 0.0),
                (10.0, 0.0),
                (10.0, 5.0),
                (5.0, 5.0),
                (5.0, 10.0),
                (0.0, 10.0),
            ]),
            Vec::new(),
        )
        .into()
    }

    #[test]
    fn test_locate_concave() {
        let region = PreparedRegion::new(&l_shape());
        assert_eq!(region.locate((2.0, 8.0)), Location::Inside);
        assert_eq!(region.locate((8.0, 8.0)), Location::Outside);
        assert_eq!(region.locate((7.0, 5.0)), Location::Boundary);
    }

    #[test]
    fn test_cell_in_notch() {
        let region = PreparedRegion::new(&l_shape());
        let cell: MultiPolygon = Polygon::rectangle(6.0, 6.0, 8.0, 8.0).into();
        assert!(!region.is_intersected_by(&cell));
        assert!(!region.contains_geometry(&cell));
    }

    #[test]
    fn test_cell_straddling_notch_edge() {
        let region = PreparedRegion::new(&l_shape());
        let cell: MultiPolygon = Polygon::rectangle(4.0, 6.0, 6.0, 8.0).into();
        assert!(region.is_intersected_by(&cell));
        assert!(!region.contains_geometry(&cell));
    }

    #[test]
    fn test_cell_covering_region() {
        let region = PreparedRegion::new(&l_shape());
        let cell: MultiPolygon = Polygon::rectangle(-1.0, -1.0, 11.0, 11.0).into();
        assert!(region.is_intersected_by(&cell));
        assert!(!region.contains_geometry(&cell));
    }
}
