//! Map panels: data coordinates to pixels with a fixed aspect ratio.

use wind_common::BoundingBox;

use crate::canvas::{Canvas, Point};
use crate::colormap::Color;
use crate::layout::Rect;

/// Placement of a map extent inside a panel.
///
/// The panel shrinks along one axis so that one data unit spans the same
/// number of pixels in x as `aspect` data units do in y; the map stays
/// centred in the panel.
#[derive(Debug, Clone, Copy)]
pub struct MapFrame {
    pub rect: Rect,
    pub extent: BoundingBox,
}

impl MapFrame {
    pub fn fit(panel: Rect, extent: BoundingBox, aspect: f64) -> Self {
        let data_w = extent.width().max(f64::MIN_POSITIVE);
        let data_h = (extent.height() * aspect).max(f64::MIN_POSITIVE);
        let data_ratio = (data_w / data_h) as f32;
        let panel_ratio = panel.width / panel.height.max(f32::MIN_POSITIVE);

        let (w, h) = if panel_ratio > data_ratio {
            (panel.height * data_ratio, panel.height)
        } else {
            (panel.width, panel.width / data_ratio)
        };
        Self {
            rect: panel.anchored(w, h, 0.5, 0.5),
            extent,
        }
    }

    /// Aspect that keeps lon/lat maps looking right at their mid latitude.
    pub fn geographic_aspect(extent: &BoundingBox) -> f64 {
        let mid_lat = (extent.min_y + extent.max_y) / 2.0;
        1.0 / mid_lat.to_radians().cos().max(1e-6)
    }

    pub fn to_pixel(&self, x: f64, y: f64) -> Point {
        let fx = (x - self.extent.min_x) / self.extent.width();
        let fy = (self.extent.max_y - y) / self.extent.height();
        (
            self.rect.x + fx as f32 * self.rect.width,
            self.rect.y + fy as f32 * self.rect.height,
        )
    }

    pub fn project(&self, points: &[(f64, f64)]) -> Vec<Point> {
        points.iter().map(|&(x, y)| self.to_pixel(x, y)).collect()
    }

    /// Fill a polygon given as data-coordinate rings (exterior first).
    ///
    /// Cells are drawn without anti-aliasing so that neighbours meet
    /// without seams.
    pub fn fill(&self, canvas: &mut Canvas, rings: &[&[(f64, f64)]], color: Color) {
        let projected: Vec<Vec<Point>> = rings.iter().map(|r| self.project(r)).collect();
        canvas.fill_rings(&projected, color, false);
    }

    /// Outline a closed ring in data coordinates.
    pub fn outline(&self, canvas: &mut Canvas, ring: &[(f64, f64)], width: f32, color: Color) {
        canvas.stroke_polyline(&self.project(ring), true, width, color);
    }
}
