//! Horizontal colorbars.

use crate::canvas::Canvas;
use crate::colormap::{Color, ScalarMappable};
use crate::layout::{FigureScale, Rect};
use crate::text::{FontBook, FontFace, HAlign, TextItem, VAlign};
use crate::ticks::{format_ticks, nice_ticks, tick_bins};

/// Sizing of a colorbar relative to the panel it sits in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorbarLayout {
    /// Fraction of the panel width used by the bar
    pub shrink: f32,
    /// Bar length divided by bar thickness
    pub aspect: f32,
    pub tick_font_pt: f32,
    pub label_font_pt: f32,
}

impl Default for ColorbarLayout {
    fn default() -> Self {
        Self {
            shrink: 0.8,
            aspect: 40.0,
            tick_font_pt: 10.0,
            label_font_pt: 12.0,
        }
    }
}

/// Draw a horizontal colorbar hanging from the top of `panel`, with ticks
/// and `label` underneath. Returns the bar rectangle.
pub fn draw_horizontal_colorbar(
    canvas: &mut Canvas,
    fonts: &FontBook,
    scale: FigureScale,
    panel: Rect,
    mappable: &ScalarMappable,
    label: &str,
    layout: &ColorbarLayout,
) -> Rect {
    let width = panel.width * layout.shrink;
    let bar = panel.anchored(width, width / layout.aspect, 0.5, 0.0);

    let columns = bar.width.ceil().max(1.0) as usize;
    for i in 0..columns {
        let t = (i as f32 + 0.5) / columns as f32;
        let color = mappable.cmap.at(t);
        let x = bar.x + i as f32 * bar.width / columns as f32;
        canvas.fill_rect(Rect::new(x, bar.y, bar.width / columns as f32 + 0.5, bar.height), color);
    }

    let line_w = scale.px(0.8);
    let outline = [
        (bar.x, bar.y),
        (bar.right(), bar.y),
        (bar.right(), bar.bottom()),
        (bar.x, bar.bottom()),
    ];
    canvas.stroke_polyline(&outline, true, line_w, Color::BLACK);

    let tick_font = scale.px(layout.tick_font_pt);
    let tick_len = scale.px(3.5);
    let pad = scale.px(3.5);
    let (vmin, vmax) = (mappable.norm.vmin, mappable.norm.vmax);
    let ticks = nice_ticks(vmin, vmax, tick_bins(bar.width, tick_font, true));
    let labels = format_ticks(&ticks);

    for (value, text) in ticks.iter().zip(labels) {
        let Some(t) = mappable.norm.apply(*value) else {
            continue;
        };
        let x = bar.x + t * bar.width;
        canvas.line((x, bar.bottom()), (x, bar.bottom() + tick_len), line_w, Color::BLACK);
        canvas.text(
            TextItem::new(text, x, bar.bottom() + tick_len + pad, tick_font)
                .align(HAlign::Center, VAlign::Top),
        );
    }

    let (_, tick_h) = fonts.measure("0", tick_font, FontFace::Regular);
    let label_y = bar.bottom() + tick_len + pad + tick_h + scale.px(4.0);
    canvas.text(
        TextItem::new(label, bar.center_x(), label_y, scale.px(layout.label_font_pt))
            .align(HAlign::Center, VAlign::Top),
    );

    bar
}
