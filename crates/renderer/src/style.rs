//! Colour parsing and colormap definitions loaded from JSON.
//!
//! A style file maps colormap names to colour stops:
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "colormaps": {
//!     "winds": {
//!       "name": "winds",
//!       "stops": [
//!         {"value": 0.0, "color": "#000004"},
//!         {"value": 1.0, "color": "#fcfdbf"}
//!       ]
//!     }
//!   }
//! }
//! ```
//!
//! Stop values are positions on the normalised `[0, 1]` scale.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::colormap::{Color, Colormap};
use crate::error::{RenderError, RenderResult};

/// Extra colormaps keyed by name.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StyleConfig {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub colormaps: HashMap<String, ColormapDefinition>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColormapDefinition {
    pub name: String,
    pub description: Option<String>,
    pub stops: Vec<ColorStop>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColorStop {
    pub value: f32,
    pub color: String,
}

impl StyleConfig {
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> RenderResult<Self> {
        let path = path.as_ref();
        let style_error = |message: String| RenderError::Style {
            path: path.display().to_string(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| style_error(e.to_string()))?;
        Self::from_json(&content).map_err(|e| style_error(e.to_string()))
    }

    /// Build a named colormap, if defined here.
    pub fn colormap(&self, name: &str) -> Option<RenderResult<Colormap>> {
        self.colormaps.get(name).map(ColormapDefinition::to_colormap)
    }
}

impl ColormapDefinition {
    pub fn to_colormap(&self) -> RenderResult<Colormap> {
        let mut stops = self
            .stops
            .iter()
            .map(|s| {
                parse_color(&s.color)
                    .map(|c| (s.value, c))
                    .ok_or_else(|| RenderError::InvalidColor(s.color.clone()))
            })
            .collect::<RenderResult<Vec<_>>>()?;
        stops.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        Colormap::new(&self.name, stops)
    }
}

/// `#rrggbb` (leading `#` optional) as an RGB triple.
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Parse `#rrggbb` or one of the basic colour names.
pub fn parse_color(spec: &str) -> Option<Color> {
    let spec = spec.trim();
    let named = match spec.to_ascii_lowercase().as_str() {
        "black" | "k" => Some((0, 0, 0)),
        "white" | "w" => Some((255, 255, 255)),
        "red" | "r" => Some((255, 0, 0)),
        "blue" | "b" => Some((0, 0, 255)),
        "green" | "g" => Some((0, 128, 0)),
        "orange" => Some((255, 165, 0)),
        "purple" => Some((128, 0, 128)),
        "gray" | "grey" => Some((128, 128, 128)),
        _ => None,
    };
    named
        .or_else(|| hex_to_rgb(spec))
        .map(|(r, g, b)| Color::new(r, g, b, 255))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_rgb() {
        assert_eq!(hex_to_rgb("#FF0000"), Some((255, 0, 0)));
        assert_eq!(hex_to_rgb("#00FF00"), Some((0, 255, 0)));
        assert_eq!(hex_to_rgb("#0000FF"), Some((0, 0, 255)));
        assert_eq!(hex_to_rgb("FF0000"), Some((255, 0, 0)));
        assert_eq!(hex_to_rgb("#GGGGGG"), None);
    }

    #[test]
    fn test_named_colors() {
        assert_eq!(parse_color("red"), Some(Color::new(255, 0, 0, 255)));
        assert_eq!(parse_color("Blue"), Some(Color::new(0, 0, 255, 255)));
        assert_eq!(parse_color("#7f3b08"), Some(Color::new(127, 59, 8, 255)));
        assert_eq!(parse_color("chartreuse-ish"), None);
    }
}
