//! Colormaps and value normalisation.

use crate::error::{RenderError, RenderResult};
use crate::style::hex_to_rgb;

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    pub const WHITE: Color = Color::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Linear color interpolation
pub fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;
    let mix = |a: u8, b: u8| ((a as f32 * t_inv) + (b as f32 * t)).round() as u8;

    Color::new(
        mix(color1.r, color2.r),
        mix(color1.g, color2.g),
        mix(color1.b, color2.b),
        mix(color1.a, color2.a),
    )
}

const MAGMA: [&str; 9] = [
    "#000004", "#1c1044", "#4f127b", "#812581", "#b5367a", "#e55064", "#fb8761", "#fec287",
    "#fcfdbf",
];

const PUOR: [&str; 11] = [
    "#7f3b08", "#b35806", "#e08214", "#fdb863", "#fee0b6", "#f7f7f7", "#d8daeb", "#b2abd2",
    "#8073ac", "#542788", "#2d004b",
];

/// A piecewise-linear colour ramp over `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    pub name: String,
    stops: Vec<(f32, Color)>,
}

impl Colormap {
    /// Stops must be sorted by position.
    pub fn new(name: &str, stops: Vec<(f32, Color)>) -> RenderResult<Self> {
        if stops.is_empty() {
            return Err(RenderError::UnknownColormap(format!("{} has no stops", name)));
        }
        Ok(Self {
            name: name.to_string(),
            stops,
        })
    }

    /// Evenly spaced stops from hex strings.
    pub fn from_hex(name: &str, colors: &[&str]) -> RenderResult<Self> {
        let last = colors.len().saturating_sub(1).max(1) as f32;
        let stops = colors
            .iter()
            .enumerate()
            .map(|(i, hex)| {
                hex_to_rgb(hex)
                    .map(|(r, g, b)| (i as f32 / last, Color::new(r, g, b, 255)))
                    .ok_or_else(|| RenderError::InvalidColor(hex.to_string()))
            })
            .collect::<RenderResult<Vec<_>>>()?;
        Self::new(name, stops)
    }

    /// Built-in maps by name; a `_r` suffix reverses any of them.
    pub fn by_name(name: &str) -> RenderResult<Self> {
        if let Some(base) = name.strip_suffix("_r") {
            return Self::by_name(base).map(|c| c.reversed(name));
        }
        match name {
            "magma" => Self::from_hex(name, &MAGMA),
            "PuOr" => Self::from_hex(name, &PUOR),
            "greys" | "Greys" => Self::from_hex(name, &["#ffffff", "#000000"]),
            _ => Err(RenderError::UnknownColormap(name.to_string())),
        }
    }

    pub fn reversed(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            stops: self.stops.iter().rev().map(|&(v, c)| (1.0 - v, c)).collect(),
        }
    }

    /// Colour at normalised position `t` (clamped to `[0, 1]`).
    pub fn at(&self, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let first = self.stops[0];
        if t <= first.0 {
            return first.1;
        }
        for pair in self.stops.windows(2) {
            let (v0, c0) = pair[0];
            let (v1, c1) = pair[1];
            if t <= v1 {
                let span = v1 - v0;
                let local = if span > 0.0 { (t - v0) / span } else { 0.0 };
                return interpolate_color(c0, c1, local);
            }
        }
        self.stops[self.stops.len() - 1].1
    }
}

/// Linear mapping of `[vmin, vmax]` onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalize {
    pub vmin: f64,
    pub vmax: f64,
}

impl Normalize {
    pub fn new(vmin: f64, vmax: f64) -> Self {
        Self { vmin, vmax }
    }

    /// `None` for missing values; out-of-range values are clipped.
    pub fn apply(&self, value: f64) -> Option<f32> {
        if !value.is_finite() {
            return None;
        }
        let span = self.vmax - self.vmin;
        if span <= 0.0 {
            return Some(0.0);
        }
        Some(((value - self.vmin) / span).clamp(0.0, 1.0) as f32)
    }
}

/// A colormap together with its normalisation.
#[derive(Debug, Clone)]
pub struct ScalarMappable {
    pub cmap: Colormap,
    pub norm: Normalize,
}

impl ScalarMappable {
    pub fn new(cmap: Colormap, norm: Normalize) -> Self {
        Self { cmap, norm }
    }

    pub fn color(&self, value: f64) -> Option<Color> {
        self.norm.apply(value).map(|t| self.cmap.at(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_midpoint() {
        let c = interpolate_color(Color::BLACK, Color::WHITE, 0.5);
        assert_eq!(c, Color::new(128, 128, 128, 255));
    }

    #[test]
    fn test_magma_endpoints() {
        let magma = Colormap::by_name("magma").unwrap();
        assert_eq!(magma.at(0.0), Color::new(0, 0, 4, 255));
        assert_eq!(magma.at(1.0), Color::new(252, 253, 191, 255));
        assert_eq!(magma.at(2.0), magma.at(1.0));
    }

    #[test]
    fn test_puor_center_is_neutral() {
        let puor = Colormap::by_name("PuOr").unwrap();
        assert_eq!(puor.at(0.5), Color::new(247, 247, 247, 255));
        assert_eq!(puor.at(0.0), Color::new(127, 59, 8, 255));
    }

    #[test]
    fn test_reversed_suffix() {
        let r = Colormap::by_name("magma_r").unwrap();
        assert_eq!(r.at(0.0), Color::new(252, 253, 191, 255));
        assert!(Colormap::by_name("jet").is_err());
    }

    #[test]
    fn test_normalize() {
        let norm = Normalize::new(-1.0, 1.0);
        assert_eq!(norm.apply(0.0), Some(0.5));
        assert_eq!(norm.apply(3.0), Some(1.0));
        assert_eq!(norm.apply(f64::NAN), None);
        assert_eq!(Normalize::new(2.0, 2.0).apply(2.0), Some(0.0));
    }
}
