//! Text rendering with TrueType fonts.
//!
//! Fonts are read from disk at start-up. When no font can be loaded the
//! figure is still produced, without any text.

use std::path::{Path, PathBuf};

use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use rusttype::{point, Font, Scale};
use tracing::{debug, warn};

use crate::colormap::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontFace {
    #[default]
    Regular,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VAlign {
    #[default]
    Top,
    Center,
    Bottom,
}

/// A piece of text anchored at a pixel position.
#[derive(Debug, Clone)]
pub struct TextItem {
    pub text: String,
    pub x: f32,
    pub y: f32,
    /// Font size in pixels
    pub size: f32,
    pub color: Color,
    pub face: FontFace,
    pub halign: HAlign,
    pub valign: VAlign,
    /// Rotated 90 degrees counter-clockwise (reads bottom to top)
    pub vertical: bool,
}

impl TextItem {
    pub fn new(text: impl Into<String>, x: f32, y: f32, size: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            size,
            color: Color::BLACK,
            face: FontFace::Regular,
            halign: HAlign::Left,
            valign: VAlign::Top,
            vertical: false,
        }
    }

    pub fn face(mut self, face: FontFace) -> Self {
        self.face = face;
        self
    }

    pub fn align(mut self, halign: HAlign, valign: VAlign) -> Self {
        self.halign = halign;
        self.valign = valign;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn vertical(mut self) -> Self {
        self.vertical = true;
        self
    }
}

/// Font file locations for each face.
#[derive(Debug, Clone, Default)]
pub struct FontPaths {
    pub regular: Option<PathBuf>,
    pub bold: Option<PathBuf>,
    pub italic: Option<PathBuf>,
}

/// Loaded fonts. Missing bold or italic faces fall back to regular.
#[derive(Default)]
pub struct FontBook {
    regular: Option<Font<'static>>,
    bold: Option<Font<'static>>,
    italic: Option<Font<'static>>,
    /// Name the regular face is registered under for chart labels
    chart_family: Option<&'static str>,
}

/// Family name of the regular face in the chart font registry.
const CHART_FAMILY: &str = "wind-compare-regular";

/// Font files stay loaded for the whole run, and chart labels need them
/// with a static lifetime.
fn read_font(path: &Path) -> Option<(Font<'static>, &'static [u8])> {
    let bytes: &'static [u8] = match std::fs::read(path) {
        Ok(bytes) => Box::leak(bytes.into_boxed_slice()),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Font not readable");
            return None;
        }
    };
    match Font::try_from_bytes(bytes) {
        Some(font) => Some((font, bytes)),
        None => {
            warn!(path = %path.display(), "Not a usable TrueType font");
            None
        }
    }
}

fn load_font(path: &Path) -> Option<Font<'static>> {
    read_font(path).map(|(font, _)| font)
}

fn register_chart_font(bytes: &'static [u8]) -> Option<&'static str> {
    match plotters::style::register_font(CHART_FAMILY, plotters::style::FontStyle::Normal, bytes) {
        Ok(()) => Some(CHART_FAMILY),
        Err(_) => {
            warn!("Regular font rejected by the chart renderer; chart labels will be missing");
            None
        }
    }
}

impl FontBook {
    pub fn load(paths: &FontPaths) -> Self {
        let regular = paths.regular.as_deref().and_then(read_font);
        let book = Self {
            chart_family: regular.as_ref().and_then(|(_, bytes)| register_chart_font(bytes)),
            regular: regular.map(|(font, _)| font),
            bold: paths.bold.as_deref().and_then(load_font),
            italic: paths.italic.as_deref().and_then(load_font),
        };
        if book.regular.is_none() {
            warn!("No regular font could be loaded; figure text will be missing");
        }
        book
    }

    /// A book without fonts; text is measured as zero-sized and not drawn.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_fonts(&self) -> bool {
        self.regular.is_some()
    }

    /// Font family for chart tick and legend labels, when one is registered.
    pub fn chart_family(&self) -> Option<&'static str> {
        self.chart_family
    }

    fn font(&self, face: FontFace) -> Option<&Font<'static>> {
        let preferred = match face {
            FontFace::Regular => None,
            FontFace::Bold => self.bold.as_ref(),
            FontFace::Italic => self.italic.as_ref(),
        };
        preferred.or(self.regular.as_ref())
    }

    /// Width and height of a single line of text in pixels.
    pub fn measure(&self, text: &str, size: f32, face: FontFace) -> (f32, f32) {
        let Some(font) = self.font(face) else {
            return (0.0, 0.0);
        };
        let scale = Scale::uniform(size);
        let v = font.v_metrics(scale);
        let width = font
            .layout(text, scale, point(0.0, 0.0))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0);
        (width, v.ascent - v.descent)
    }

    /// Draw `item` onto `image`.
    pub fn draw(&self, image: &mut RgbaImage, item: &TextItem) {
        let Some(font) = self.font(item.face) else {
            return;
        };
        if item.text.is_empty() {
            return;
        }
        let (w, h) = self.measure(&item.text, item.size, item.face);
        let scale = Scale::uniform(item.size);

        // Extent on the page, after rotation
        let (page_w, page_h) = if item.vertical { (h, w) } else { (w, h) };
        let left = match item.halign {
            HAlign::Left => item.x,
            HAlign::Center => item.x - page_w / 2.0,
            HAlign::Right => item.x - page_w,
        };
        let top = match item.valign {
            VAlign::Top => item.y,
            VAlign::Center => item.y - page_h / 2.0,
            VAlign::Bottom => item.y - page_h,
        };

        let [r, g, b, a] = item.color.to_rgba();
        if !item.vertical {
            draw_text_mut(
                image,
                Rgba([r, g, b, a]),
                left.round() as i32,
                top.round() as i32,
                scale,
                font,
                &item.text,
            );
            return;
        }

        // Render horizontally into a transparent strip, then turn it
        let mut strip = RgbaImage::new(w.ceil().max(1.0) as u32, h.ceil().max(1.0) as u32);
        draw_text_mut(&mut strip, Rgba([r, g, b, a]), 0, 0, scale, font, &item.text);
        // Coverage ends up in alpha; restore the straight colour
        for px in strip.pixels_mut() {
            if px.0[3] > 0 {
                px.0[0] = r;
                px.0[1] = g;
                px.0[2] = b;
            }
        }
        let turned = imageops::rotate270(&strip);
        imageops::overlay(image, &turned, left.round() as i64, top.round() as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_book_measures_zero() {
        let book = FontBook::empty();
        assert!(!book.has_fonts());
        assert_eq!(book.chart_family(), None);
        assert_eq!(book.measure("abc", 12.0, FontFace::Bold), (0.0, 0.0));

        // Drawing without fonts leaves the image untouched
        let mut image = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        book.draw(&mut image, &TextItem::new("abc", 0.0, 0.0, 12.0));
        assert!(image.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_missing_font_file() {
        let book = FontBook::load(&FontPaths {
            regular: Some(PathBuf::from("/nonexistent/font.ttf")),
            ..Default::default()
        });
        assert!(!book.has_fonts());
        assert_eq!(book.chart_family(), None);
    }
}
