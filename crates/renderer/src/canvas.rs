//! Raster canvas for figure composition.
//!
//! Shapes are drawn straight into a `tiny_skia` pixmap. Text is queued and
//! rasterised last by [`Canvas::into_image`], so labels always sit on top.

use image::{Rgba, RgbaImage};
use tiny_skia::{FillRule, LineCap, LineJoin, Mask, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::colormap::Color;
use crate::error::{RenderError, RenderResult};
use crate::layout::Rect;
use crate::text::{FontBook, TextItem};

pub type Point = (f32, f32);

pub struct Canvas {
    pixmap: Pixmap,
    clip: Option<Mask>,
    texts: Vec<TextItem>,
}

fn paint(color: Color, anti_alias: bool) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = anti_alias;
    paint
}

fn polyline_path(points: &[Point], closed: bool) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.0, first.1);
    for p in rest {
        pb.line_to(p.0, p.1);
    }
    if closed {
        pb.close();
    }
    pb.finish()
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Color) -> RenderResult<Self> {
        let mut pixmap =
            Pixmap::new(width, height).ok_or(RenderError::InvalidCanvas { width, height })?;
        pixmap.fill(tiny_skia::Color::from_rgba8(
            background.r,
            background.g,
            background.b,
            background.a,
        ));
        Ok(Self {
            pixmap,
            clip: None,
            texts: Vec::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Restrict later shape drawing to `rect`; `None` lifts the clip.
    /// Queued text is never clipped.
    pub fn clip_to(&mut self, rect: Option<Rect>) {
        let (width, height) = (self.pixmap.width(), self.pixmap.height());
        self.clip = rect.and_then(|r| {
            let rect = tiny_skia::Rect::from_xywh(r.x, r.y, r.width, r.height)?;
            let mut mask = Mask::new(width, height)?;
            mask.fill_path(
                &PathBuilder::from_rect(rect),
                FillRule::Winding,
                false,
                Transform::identity(),
            );
            Some(mask)
        });
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        if let Some(r) = tiny_skia::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height) {
            self.pixmap
                .fill_rect(r, &paint(color, false), Transform::identity(), self.clip.as_ref());
        }
    }

    /// Fill a set of rings with the even-odd rule, so inner rings cut holes.
    pub fn fill_rings(&mut self, rings: &[Vec<Point>], color: Color, anti_alias: bool) {
        let mut pb = PathBuilder::new();
        for ring in rings {
            let Some((first, rest)) = ring.split_first() else {
                continue;
            };
            pb.move_to(first.0, first.1);
            for p in rest {
                pb.line_to(p.0, p.1);
            }
            pb.close();
        }
        if let Some(path) = pb.finish() {
            self.pixmap.fill_path(
                &path,
                &paint(color, anti_alias),
                FillRule::EvenOdd,
                Transform::identity(),
                self.clip.as_ref(),
            );
        }
    }

    pub fn stroke_polyline(&mut self, points: &[Point], closed: bool, width: f32, color: Color) {
        let Some(path) = polyline_path(points, closed) else {
            return;
        };
        let stroke = Stroke {
            width,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint(color, true), &stroke, Transform::identity(), self.clip.as_ref());
    }

    pub fn line(&mut self, from: Point, to: Point, width: f32, color: Color) {
        self.stroke_polyline(&[from, to], false, width, color);
    }

    /// Copy a packed RGB buffer of `width` x `height` pixels with its top
    /// left corner at (`x`, `y`). Pixels equal to `skip` are left out, so
    /// the buffer background does not cover what is already drawn. The clip
    /// mask does not apply.
    pub fn blit_rgb(&mut self, x: i32, y: i32, width: u32, height: u32, rgb: &[u8], skip: Color) {
        let (canvas_w, canvas_h) = (self.pixmap.width() as i64, self.pixmap.height() as i64);
        let pixels = self.pixmap.pixels_mut();
        for (i, px) in rgb.chunks_exact(3).take(width as usize * height as usize).enumerate() {
            if (px[0], px[1], px[2]) == (skip.r, skip.g, skip.b) {
                continue;
            }
            let cx = x as i64 + (i % width as usize) as i64;
            let cy = y as i64 + (i / width as usize) as i64;
            if cx < 0 || cy < 0 || cx >= canvas_w || cy >= canvas_h {
                continue;
            }
            if let Some(color) = tiny_skia::PremultipliedColorU8::from_rgba(px[0], px[1], px[2], 255) {
                pixels[(cy * canvas_w + cx) as usize] = color;
            }
        }
    }

    pub fn text(&mut self, item: TextItem) {
        self.texts.push(item);
    }

    /// Rasterise queued text and return the finished image.
    pub fn into_image(self, fonts: &FontBook) -> RgbaImage {
        let (width, height) = (self.pixmap.width(), self.pixmap.height());
        let mut image = RgbaImage::new(width, height);
        for (dst, src) in image.pixels_mut().zip(self.pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        for item in &self.texts {
            fonts.draw(&mut image, item);
        }
        image
    }
}

/// Crop to the smallest box holding every pixel that differs from
/// `background`.
pub fn crop_to_content(image: &RgbaImage, background: Color) -> RgbaImage {
    let bg = background.to_rgba();
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (u32::MAX, u32::MAX, 0u32, 0u32);
    for (x, y, px) in image.enumerate_pixels() {
        if px.0 != bg {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }
    if min_x > max_x || min_y > max_y {
        return image.clone();
    }
    image::imageops::crop_imm(image, min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
        .to_image()
}
