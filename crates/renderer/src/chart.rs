//! Line charts over a categorical x axis, drawn with `plotters`.
//!
//! The chart is rendered into an RGB buffer covering the plot area and its
//! tick label margins, then composited onto the figure canvas. Axis titles
//! go through the canvas text queue so each can have its own size.

use plotters::coord::combinators::BindKeyPoints;
use plotters::prelude::*;
// Trait methods only, `Color` names the figure colour type
use plotters::style::Color as _;
use plotters::style::{FontDesc, FontFamily, FontStyle, TRANSPARENT};

use crate::canvas::{Canvas, Point};
use crate::colormap::Color;
use crate::error::{RenderError, RenderResult};
use crate::layout::{FigureScale, Rect};
use crate::text::{FontBook, FontFace, HAlign, TextItem, VAlign};
use crate::ticks::{format_tick, nice_ticks, tick_bins, tick_decimals};

/// One line; `values[i]` belongs to category `i`, `None` leaves a gap.
#[derive(Debug, Clone)]
pub struct Series {
    pub label: String,
    pub color: Color,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone)]
pub struct LineChart {
    pub categories: Vec<String>,
    pub series: Vec<Series>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub legend_frame: bool,
    pub tick_font_pt: f32,
    pub x_label_font_pt: f32,
    pub y_label_font_pt: f32,
    pub line_width_pt: f32,
    pub marker_size_pt: f32,
}

/// Legend corners in order of preference, as fractional anchors in the
/// plot area.
const LEGEND_CORNERS: [(f32, f32); 4] = [(1.0, 0.0), (0.0, 0.0), (0.0, 1.0), (1.0, 1.0)];

fn corner_position(anchor: (f32, f32)) -> SeriesLabelPosition {
    match anchor {
        (ax, ay) if ax < 0.5 && ay < 0.5 => SeriesLabelPosition::UpperLeft,
        (ax, _) if ax < 0.5 => SeriesLabelPosition::LowerLeft,
        (_, ay) if ay >= 0.5 => SeriesLabelPosition::LowerRight,
        _ => SeriesLabelPosition::UpperRight,
    }
}

fn rgb(color: Color) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

fn chart_error(e: impl std::fmt::Display) -> RenderError {
    RenderError::Chart(e.to_string())
}

/// Pixel layout shared by the plotters pass and the canvas pass.
struct ChartGeometry {
    /// Plot area on the figure
    area: Rect,
    /// Width left of the plot area for y tick marks and labels
    y_margin: u32,
    /// Height under the plot area for x tick marks and labels
    x_margin: u32,
    tick_len: u32,
    tick_font: f32,
    tick_height: f32,
}

impl LineChart {
    pub fn new(categories: Vec<String>) -> Self {
        Self {
            categories,
            series: Vec::new(),
            x_label: None,
            y_label: None,
            legend_frame: false,
            tick_font_pt: 10.0,
            x_label_font_pt: 10.0,
            y_label_font_pt: 12.0,
            line_width_pt: 1.5,
            marker_size_pt: 6.0,
        }
    }

    /// Data limits with a 5 % margin on each side.
    pub fn limits(&self) -> ((f64, f64), (f64, f64)) {
        let n = self.categories.len();
        let x = if n > 1 {
            let span = (n - 1) as f64;
            (-0.05 * span, span * 1.05)
        } else {
            (-0.5, 0.5)
        };

        let (lo, hi) = self
            .series
            .iter()
            .flat_map(|s| s.values.iter().flatten())
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let y = if lo > hi {
            (0.0, 1.0)
        } else if lo == hi {
            let pad = if lo == 0.0 { 0.5 } else { lo.abs() * 0.05 };
            (lo - pad, hi + pad)
        } else {
            let pad = (hi - lo) * 0.05;
            (lo - pad, hi + pad)
        };
        (x, y)
    }

    /// Runs of consecutive finite points of one series.
    fn runs(series: &Series) -> Vec<Vec<(f64, f64)>> {
        let mut runs = vec![Vec::new()];
        for (i, value) in series.values.iter().enumerate() {
            match (value.filter(|v| v.is_finite()), runs.last_mut()) {
                (Some(v), Some(run)) => run.push((i as f64, v)),
                _ => runs.push(Vec::new()),
            }
        }
        runs.retain(|r| !r.is_empty());
        runs
    }

    /// Draw the chart with its plot area at `area`.
    pub fn draw(&self, canvas: &mut Canvas, fonts: &FontBook, scale: FigureScale, area: Rect) -> RenderResult<()> {
        let ((x0, x1), (y0, y1)) = self.limits();
        let tick_font = scale.px(self.tick_font_pt);
        let pad = scale.px(3.5);
        let tick_len = scale.px(3.5).round().max(1.0) as u32;

        // Without a font there is nothing to label the ticks with
        let family = fonts.chart_family();
        let y_ticks = nice_ticks(y0, y1, tick_bins(area.height, tick_font, false));
        let decimals = tick_decimals(&y_ticks);
        let y_labels: Vec<String> = y_ticks.iter().map(|&t| format_tick(t, decimals)).collect();
        let x_ticks: Vec<f64> = (0..self.categories.len()).map(|i| i as f64).collect();

        let widest = y_labels
            .iter()
            .map(|l| fonts.measure(l, tick_font, FontFace::Regular).0)
            .fold(0.0f32, f32::max);
        let (_, tick_height) = fonts.measure("0", tick_font, FontFace::Regular);
        let geometry = ChartGeometry {
            area,
            y_margin: (tick_len as f32 + pad + widest).ceil() as u32,
            x_margin: (tick_len as f32 + pad + tick_height).ceil() as u32,
            tick_len,
            tick_font,
            tick_height,
        };

        let width = (area.width.round() as u32 + geometry.y_margin).max(1);
        let height = (area.height.round() as u32 + geometry.x_margin).max(1);
        let mut buffer = vec![255u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            let key_points = |ticks: Vec<f64>| if family.is_some() { ticks } else { Vec::new() };
            let mut chart = ChartBuilder::on(&root)
                .margin(0)
                .x_label_area_size(geometry.x_margin)
                .y_label_area_size(geometry.y_margin)
                .build_cartesian_2d(
                    (x0..x1).with_key_points(key_points(x_ticks)),
                    (y0..y1).with_key_points(key_points(y_ticks.clone())),
                )
                .map_err(chart_error)?;

            let tick_style = |family: &'static str| {
                TextStyle::from(FontDesc::new(FontFamily::Name(family), f64::from(tick_font), FontStyle::Normal))
                    .color(&BLACK)
            };
            let x_formatter = |x: &f64| {
                self.categories
                    .get(x.round().max(0.0) as usize)
                    .cloned()
                    .unwrap_or_default()
            };
            let y_formatter = |y: &f64| {
                y_ticks
                    .iter()
                    .position(|t| (t - y).abs() <= 1e-9 * (y1 - y0).abs())
                    .map(|i| y_labels[i].clone())
                    .unwrap_or_else(|| format_tick(*y, decimals))
            };

            let mut mesh = chart.configure_mesh();
            mesh.disable_mesh()
                .axis_style(BLACK.stroke_width(scale.px(0.8).round().max(1.0) as u32))
                .set_all_tick_mark_size(geometry.tick_len as i32)
                .x_labels(self.categories.len())
                .y_labels(y_labels.len())
                .x_label_formatter(&x_formatter)
                .y_label_formatter(&y_formatter);
            if let Some(family) = family {
                mesh.x_label_style(tick_style(family)).y_label_style(tick_style(family));
            }
            mesh.draw().map_err(chart_error)?;

            let line_px = scale.px(self.line_width_pt).round().max(1.0) as u32;
            let radius = (scale.px(self.marker_size_pt) / 2.0).round().max(1.0) as u32;
            let edge_px = scale.px(0.75).round().max(1.0) as u32;
            for series in &self.series {
                let color = rgb(series.color);
                for (n, run) in Self::runs(series).into_iter().enumerate() {
                    let drawn = chart
                        .draw_series(LineSeries::new(run.clone(), color.stroke_width(line_px)))
                        .map_err(chart_error)?;
                    if n == 0 {
                        drawn
                            .label(series.label.as_str())
                            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(line_px)));
                    }
                    chart
                        .draw_series(run.iter().map(|&p| Circle::new(p, radius, color.filled())))
                        .map_err(chart_error)?;
                    chart
                        .draw_series(run.iter().map(|&p| Circle::new(p, radius, WHITE.stroke_width(edge_px))))
                        .map_err(chart_error)?;
                }
            }

            if let (Some(family), false) = (family, self.series.is_empty()) {
                let position = self.legend_corner(fonts, &geometry, ((x0, x1), (y0, y1)));
                let border = if self.legend_frame {
                    RGBColor(204, 204, 204).stroke_width(1)
                } else {
                    TRANSPARENT.stroke_width(0)
                };
                let background = if self.legend_frame { WHITE.filled() } else { TRANSPARENT.filled() };
                chart
                    .configure_series_labels()
                    .position(position)
                    .margin((0.5 * tick_font).round() as u32)
                    .label_font(tick_style(family))
                    .border_style(border)
                    .background_style(background)
                    .draw()
                    .map_err(chart_error)?;
            }
            root.present().map_err(chart_error)?;
        }

        let origin_x = (area.x.round() as i32) - geometry.y_margin as i32;
        canvas.blit_rgb(origin_x, area.y.round() as i32, width, height, &buffer, Color::WHITE);
        self.draw_axis_titles(canvas, scale, &geometry, widest);
        Ok(())
    }

    /// Corner whose legend box covers the fewest data points.
    fn legend_corner(
        &self,
        fonts: &FontBook,
        geometry: &ChartGeometry,
        ((x0, x1), (y0, y1)): ((f64, f64), (f64, f64)),
    ) -> SeriesLabelPosition {
        let area = geometry.area;
        let font = geometry.tick_font;
        let label_w = self
            .series
            .iter()
            .map(|s| fonts.measure(&s.label, font, FontFace::Regular).0)
            .fold(0.0f32, f32::max);
        let margin = 0.5 * font;
        let width = 20.0 + 2.0 * margin + label_w;
        let height = self.series.len() as f32 * font * 1.5 + margin;

        let to_px = |i: f64, v: f64| -> Point {
            (
                area.x + ((i - x0) / (x1 - x0)) as f32 * area.width,
                area.bottom() - ((v - y0) / (y1 - y0)) as f32 * area.height,
            )
        };
        let points: Vec<Point> = self
            .series
            .iter()
            .flat_map(|s| Self::runs(s).into_iter().flatten())
            .map(|(i, v)| to_px(i, v))
            .collect();

        let best = LEGEND_CORNERS
            .iter()
            .copied()
            .min_by_key(|&(ax, ay)| {
                let rect = area.anchored(width.min(area.width), height.min(area.height), ax, ay);
                points.iter().filter(|p| rect.contains(p.0, p.1)).count()
            })
            .unwrap_or(LEGEND_CORNERS[0]);
        corner_position(best)
    }

    fn draw_axis_titles(&self, canvas: &mut Canvas, scale: FigureScale, geometry: &ChartGeometry, widest: f32) {
        let area = geometry.area;
        let pad = scale.px(3.5);
        if let Some(label) = &self.x_label {
            let top = area.bottom() + geometry.tick_len as f32 + pad + geometry.tick_height + scale.px(4.0);
            canvas.text(
                TextItem::new(label.clone(), area.center_x(), top, scale.px(self.x_label_font_pt))
                    .align(HAlign::Center, VAlign::Top),
            );
        }
        if let Some(label) = &self.y_label {
            let right = area.x - geometry.tick_len as f32 - pad - widest - scale.px(4.0);
            canvas.text(
                TextItem::new(label.clone(), right, area.center_y(), scale.px(self.y_label_font_pt))
                    .align(HAlign::Right, VAlign::Center)
                    .vertical(),
            );
        }
    }
}
