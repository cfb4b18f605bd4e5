//! Tests for colormap definitions loaded from style JSON.

use renderer::style::{parse_color, StyleConfig};
use renderer::{Color, Colormap, Normalize, RenderError, ScalarMappable};
use std::io::Write;

const WINDS_JSON: &str = r##"{
    "version": "1.0",
    "colormaps": {
        "winds": {
            "name": "winds",
            "description": "Calm to strong",
            "stops": [
                {"value": 1.0, "color": "#FF0000"},
                {"value": 0.0, "color": "#0000FF"}
            ]
        },
        "broken": {
            "name": "broken",
            "stops": [
                {"value": 0.0, "color": "not-a-colour"},
                {"value": 1.0, "color": "#000000"}
            ]
        }
    }
}"##;

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_parse_colormaps() {
    let config = StyleConfig::from_json(WINDS_JSON).unwrap();
    assert_eq!(config.version.as_deref(), Some("1.0"));
    assert_eq!(config.colormaps.len(), 2);
    assert_eq!(
        config.colormaps["winds"].description.as_deref(),
        Some("Calm to strong")
    );
}

#[test]
fn test_stops_are_sorted_by_value() {
    let config = StyleConfig::from_json(WINDS_JSON).unwrap();
    let cmap = config.colormap("winds").unwrap().unwrap();

    assert_eq!(cmap.at(0.0), Color::new(0, 0, 255, 255));
    assert_eq!(cmap.at(1.0), Color::new(255, 0, 0, 255));
}

#[test]
fn test_midpoint_interpolation() {
    let config = StyleConfig::from_json(WINDS_JSON).unwrap();
    let cmap = config.colormap("winds").unwrap().unwrap();

    let mid = cmap.at(0.5);
    assert_eq!(mid.g, 0);
    assert!((mid.r as i32 - 128).abs() <= 1);
    assert!((mid.b as i32 - 128).abs() <= 1);
}

#[test]
fn test_invalid_color_is_reported() {
    let config = StyleConfig::from_json(WINDS_JSON).unwrap();
    let result = config.colormap("broken").unwrap();
    assert!(matches!(result, Err(RenderError::InvalidColor(c)) if c == "not-a-colour"));
}

#[test]
fn test_unknown_colormap_name() {
    let config = StyleConfig::from_json(WINDS_JSON).unwrap();
    assert!(config.colormap("rainbow").is_none());
}

#[test]
fn test_invalid_json() {
    assert!(StyleConfig::from_json("{ not json").is_err());
}

// ============================================================================
// Files
// ============================================================================

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(WINDS_JSON.as_bytes()).unwrap();

    let config = StyleConfig::from_file(file.path()).unwrap();
    assert!(config.colormaps.contains_key("winds"));
}

#[test]
fn test_from_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = StyleConfig::from_file(dir.path().join("absent.json"));
    assert!(matches!(result, Err(RenderError::Style { .. })));
}

// ============================================================================
// Built-in maps and scalar mapping
// ============================================================================

#[test]
fn test_builtin_colormap_endpoints() {
    let magma = Colormap::by_name("magma").unwrap();
    assert_eq!(magma.at(0.0), Color::new(0, 0, 4, 255));
    assert_eq!(magma.at(1.0), Color::new(252, 253, 191, 255));

    let puor = Colormap::by_name("PuOr").unwrap();
    assert_eq!(puor.at(0.5), parse_color("#f7f7f7").unwrap());
}

#[test]
fn test_reversed_by_suffix() {
    let magma = Colormap::by_name("magma").unwrap();
    let magma_r = Colormap::by_name("magma_r").unwrap();
    assert_eq!(magma_r.at(0.0), magma.at(1.0));
    assert_eq!(magma_r.at(1.0), magma.at(0.0));
}

#[test]
fn test_unknown_builtin() {
    assert!(matches!(
        Colormap::by_name("jet"),
        Err(RenderError::UnknownColormap(_))
    ));
}

#[test]
fn test_scalar_mappable_correlation_range() {
    let mappable = ScalarMappable::new(Colormap::by_name("PuOr").unwrap(), Normalize::new(-1.0, 1.0));

    assert_eq!(mappable.color(0.0), parse_color("#f7f7f7"));
    assert_eq!(mappable.color(-1.0), parse_color("#7f3b08"));
    assert_eq!(mappable.color(2.0), parse_color("#2d004b"));
    assert_eq!(mappable.color(f64::NAN), None);
}
