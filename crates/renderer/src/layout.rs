//! Figure geometry: pixel rectangles and grid-spec layouts.

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};

/// Axis-aligned pixel rectangle; `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(x, y, self.right().max(other.right()) - x, self.bottom().max(other.bottom()) - y)
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    /// A `width` x `height` box placed inside `self` at fractional anchor
    /// `(ax, ay)`; `(0.5, 0.5)` centres it, `(0.5, 0.0)` hangs it from the top.
    pub fn anchored(&self, width: f32, height: f32, ax: f32, ay: f32) -> Rect {
        Rect::new(
            self.x + (self.width - width) * ax,
            self.y + (self.height - height) * ay,
            width,
            height,
        )
    }
}

/// Converts typographic points to pixels at a given resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FigureScale {
    pub dpi: f32,
}

impl FigureScale {
    pub fn new(dpi: f32) -> Self {
        Self { dpi }
    }

    /// Pixels for a length given in points (1/72 inch).
    pub fn px(&self, points: f32) -> f32 {
        points * self.dpi / 72.0
    }

    /// Pixels for a length given in inches.
    pub fn inches(&self, inches: f32) -> u32 {
        (inches * self.dpi).round() as u32
    }
}

/// Grid edges as figure fractions, measured from the left and the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            left: 0.125,
            right: 0.9,
            top: 0.88,
            bottom: 0.11,
        }
    }
}

/// A grid of cells with relative row heights and column widths.
///
/// `wspace` and `hspace` are the gaps between cells as a fraction of the
/// average cell width or height.
#[derive(Debug, Clone)]
pub struct GridSpec {
    figure: Rect,
    margins: Margins,
    width_ratios: Vec<f32>,
    height_ratios: Vec<f32>,
    wspace: f32,
    hspace: f32,
}

/// Cell edges along one axis, as `(start, end)` offsets from the grid start.
fn cell_extents(total: f32, ratios: &[f32], space: f32) -> Vec<(f32, f32)> {
    let n = ratios.len() as f32;
    let cell = total / (n + space * (n - 1.0));
    let sep = space * cell;
    let norm = cell * n / ratios.iter().sum::<f32>();

    let mut out = Vec::with_capacity(ratios.len());
    let mut pos = 0.0;
    for (i, r) in ratios.iter().enumerate() {
        if i > 0 {
            pos += sep;
        }
        let size = r * norm;
        out.push((pos, pos + size));
        pos += size;
    }
    out
}

impl GridSpec {
    pub fn new(
        figure: Rect,
        margins: Margins,
        width_ratios: Vec<f32>,
        height_ratios: Vec<f32>,
        wspace: f32,
        hspace: f32,
    ) -> RenderResult<Self> {
        for (what, ratios) in [("width", &width_ratios), ("height", &height_ratios)] {
            if ratios.is_empty() || ratios.iter().any(|r| !(*r > 0.0)) {
                return Err(RenderError::InvalidLayout(format!(
                    "{} ratios must be positive, got {:?}",
                    what, ratios
                )));
            }
        }
        if margins.left >= margins.right || margins.bottom >= margins.top {
            return Err(RenderError::InvalidLayout(format!("{:?}", margins)));
        }
        Ok(Self {
            figure,
            margins,
            width_ratios,
            height_ratios,
            wspace,
            hspace,
        })
    }

    pub fn nrows(&self) -> usize {
        self.height_ratios.len()
    }

    pub fn ncols(&self) -> usize {
        self.width_ratios.len()
    }

    /// Pixel rectangle spanning `rows` and `cols` (half-open ranges).
    pub fn span(&self, rows: std::ops::Range<usize>, cols: std::ops::Range<usize>) -> RenderResult<Rect> {
        if rows.is_empty() || cols.is_empty() || rows.end > self.nrows() || cols.end > self.ncols() {
            return Err(RenderError::InvalidLayout(format!(
                "span {:?} x {:?} outside a {}x{} grid",
                rows,
                cols,
                self.nrows(),
                self.ncols()
            )));
        }

        let left = self.figure.x + self.figure.width * self.margins.left;
        let top = self.figure.y + self.figure.height * (1.0 - self.margins.top);
        let total_w = self.figure.width * (self.margins.right - self.margins.left);
        let total_h = self.figure.height * (self.margins.top - self.margins.bottom);

        let xs = cell_extents(total_w, &self.width_ratios, self.wspace);
        let ys = cell_extents(total_h, &self.height_ratios, self.hspace);

        let x0 = left + xs[cols.start].0;
        let x1 = left + xs[cols.end - 1].1;
        let y0 = top + ys[rows.start].0;
        let y1 = top + ys[rows.end - 1].1;
        Ok(Rect::new(x0, y0, x1 - x0, y1 - y0))
    }

    pub fn cell(&self, row: usize, col: usize) -> RenderResult<Rect> {
        self.span(row..row + 1, col..col + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_figure_grid(widths: Vec<f32>, heights: Vec<f32>, space: f32) -> GridSpec {
        GridSpec::new(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Margins {
                left: 0.0,
                right: 1.0,
                top: 1.0,
                bottom: 0.0,
            },
            widths,
            heights,
            space,
            space,
        )
        .unwrap()
    }

    #[test]
    fn test_ratios_without_spacing() {
        let grid = full_figure_grid(vec![1.0, 3.0], vec![1.0], 0.0);
        assert_eq!(grid.cell(0, 0).unwrap(), Rect::new(0.0, 0.0, 25.0, 100.0));
        assert_eq!(grid.cell(0, 1).unwrap(), Rect::new(25.0, 0.0, 75.0, 100.0));
    }

    #[test]
    fn test_spacing_between_cells() {
        // Two equal cells with a gap of 0.5 cell widths: 100 = 2c + 0.5c
        let grid = full_figure_grid(vec![1.0, 1.0], vec![1.0], 0.5);
        let a = grid.cell(0, 0).unwrap();
        let b = grid.cell(0, 1).unwrap();
        assert!((a.width - 40.0).abs() < 1e-4);
        assert!((b.x - 60.0).abs() < 1e-4);
        assert!((b.right() - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_span_covers_cells() {
        let grid = full_figure_grid(vec![2.0, 12.0, 2.0, 12.0, 12.0, 2.0], vec![1.0, 10.0], 0.0);
        let span = grid.span(1..2, 4..6).unwrap();
        let c4 = grid.cell(1, 4).unwrap();
        let c5 = grid.cell(1, 5).unwrap();
        let union = c4.union(&c5);
        assert!((span.x - union.x).abs() < 1e-3);
        assert!((span.width - union.width).abs() < 1e-3);
        assert!((span.height - union.height).abs() < 1e-3);
        assert!(grid.span(0..1, 5..7).is_err());
    }

    #[test]
    fn test_default_margins_place_grid() {
        let grid = GridSpec::new(
            Rect::new(0.0, 0.0, 1000.0, 1000.0),
            Margins::default(),
            vec![1.0],
            vec![1.0],
            0.0,
            0.0,
        )
        .unwrap();
        let cell = grid.cell(0, 0).unwrap();
        assert!((cell.x - 125.0).abs() < 1e-3);
        assert!((cell.y - 120.0).abs() < 1e-3);
        assert!((cell.bottom() - 890.0).abs() < 1e-3);
    }

    #[test]
    fn test_points_to_pixels() {
        let scale = FigureScale::new(144.0);
        assert_eq!(scale.px(12.0), 24.0);
        assert_eq!(scale.inches(15.0), 2160);
    }

    #[test]
    fn test_rejects_bad_ratios() {
        let err = GridSpec::new(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Margins::default(),
            vec![1.0, 0.0],
            vec![1.0],
            0.0,
            0.0,
        );
        assert!(err.is_err());
    }
}
