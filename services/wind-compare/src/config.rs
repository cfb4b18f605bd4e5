//! Configuration for a comparison run.
//!
//! Loaded from a single YAML file:
//!
//! ```yaml
//! inputs:
//!   cosmo-wind-speed: ${DATA_DIR}/cosmo-rea2/100m.nc
//!   newa-wind-speed: ${DATA_DIR}/newa/100m.nc
//!   cosmo-regridded-wind-speed: ${DATA_DIR}/cosmo-rea2/100m-gridded-to-newa.nc
//!   cosmo-polys: ${DATA_DIR}/cosmo-rea2/polys.geojson.gz
//!   newa-polys: ${DATA_DIR}/newa/polys.geojson.gz
//!   ch-shape: ${DATA_DIR}/gadm36_CHE_shp.zip!gadm36_CHE_0.shp
//! height: 100
//! plot-crs: EPSG:2056
//! datasets:
//!   cosmo-rea2: {x-name: rlon, y-name: rlat, long-name: COSMO-REA2}
//!   newa: {x-name: west_east, y-name: south_north, long-name: NEWA}
//! output: figures/wind-speed-100m.png
//! ```
//!
//! Supports environment variable substitution using ${VAR} and
//! ${VAR:-default} syntax.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use renderer::{Color, FontPaths};
use serde::{Deserialize, Deserializer, Serialize};
use wind_common::{CrsCode, DatasetConfig, DatasetKey, YearRange};

// ============================================================================
// Configuration structs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CompareConfig {
    pub inputs: InputPaths,
    /// Height above ground in metres, used in titles. Free-form, so `100`,
    /// `10.5` and `"100-150"` all work.
    #[serde(deserialize_with = "deserialize_height")]
    pub height: String,
    pub plot_crs: CrsCode,
    #[serde(default = "default_region_name")]
    pub region_name: String,
    #[serde(default)]
    pub correlation_period: YearRange,
    pub datasets: BTreeMap<DatasetKey, DatasetConfig>,
    #[serde(default)]
    pub style: StyleSettings,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InputPaths {
    pub cosmo_wind_speed: PathBuf,
    pub newa_wind_speed: PathBuf,
    pub cosmo_regridded_wind_speed: PathBuf,
    pub cosmo_polys: PathBuf,
    pub newa_polys: PathBuf,
    pub ch_shape: PathBuf,
}

/// Figure appearance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StyleSettings {
    pub dpi: f32,
    /// Figure size in inches
    pub width: f32,
    pub height: f32,
    pub colormap: String,
    pub correlation_colormap: String,
    /// Optional JSON file with extra colormap definitions
    pub colormap_file: Option<PathBuf>,
    pub series_colors: BTreeMap<DatasetKey, String>,
    pub fonts: FontSettings,
    /// Crop the written image to its non-background content
    pub tight_crop: bool,
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            dpi: 100.0,
            width: 15.0,
            height: 10.0,
            colormap: "magma".to_string(),
            correlation_colormap: "PuOr".to_string(),
            colormap_file: None,
            series_colors: BTreeMap::from([
                (DatasetKey::Newa, "red".to_string()),
                (DatasetKey::CosmoRea2, "blue".to_string()),
            ]),
            fonts: FontSettings::default(),
            tight_crop: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSettings {
    pub regular: Option<PathBuf>,
    pub bold: Option<PathBuf>,
    pub italic: Option<PathBuf>,
}

const DEJAVU_DIR: &str = "/usr/share/fonts/truetype/dejavu";

impl Default for FontSettings {
    fn default() -> Self {
        let font = |file: &str| Some(Path::new(DEJAVU_DIR).join(file));
        Self {
            regular: font("DejaVuSans.ttf"),
            bold: font("DejaVuSans-Bold.ttf"),
            italic: font("DejaVuSans-Oblique.ttf"),
        }
    }
}

impl FontSettings {
    pub fn to_paths(&self) -> FontPaths {
        FontPaths {
            regular: self.regular.clone(),
            bold: self.bold.clone(),
            italic: self.italic.clone(),
        }
    }
}

/// Accept a YAML number or string and keep it as written.
fn deserialize_height<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum HeightLabel {
        Integer(i64),
        Decimal(f64),
        Text(String),
    }

    Ok(match HeightLabel::deserialize(deserializer)? {
        HeightLabel::Integer(v) => v.to_string(),
        HeightLabel::Decimal(v) => v.to_string(),
        HeightLabel::Text(v) => v,
    })
}

fn default_region_name() -> String {
    "Switzerland".to_string()
}

// ============================================================================
// Loading
// ============================================================================

impl CompareConfig {
    /// Load, expand and validate a YAML config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid config file {:?}", path))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;
        let config: CompareConfig =
            serde_yaml::from_str(&expanded).context("Failed to parse config YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Per-dataset settings; the regridded dataset falls back to the
    /// settings of the grid it was regridded onto.
    pub fn dataset(&self, key: DatasetKey) -> Result<&DatasetConfig> {
        self.datasets
            .get(&key)
            .or_else(|| self.datasets.get(&key.grid_owner()))
            .with_context(|| format!("No dataset config for '{}'", key))
    }

    /// Display name used in captions and the legend.
    pub fn long_name(&self, key: DatasetKey) -> Result<&str> {
        Ok(self.dataset(key)?.long_name.as_str())
    }

    pub fn series_color(&self, key: DatasetKey) -> Result<Color> {
        let spec = self
            .style
            .series_colors
            .get(&key)
            .with_context(|| format!("No series colour for '{}'", key))?;
        renderer::style::parse_color(spec)
            .with_context(|| format!("Invalid colour '{}' for '{}'", spec, key))
    }

    pub fn validate(&self) -> Result<()> {
        for key in DatasetKey::ALL {
            let dataset = self.dataset(key)?;
            anyhow::ensure!(
                !dataset.x_name.is_empty() && !dataset.y_name.is_empty(),
                "Dataset '{}' needs both x-name and y-name",
                key
            );
        }
        anyhow::ensure!(!self.height.trim().is_empty(), "Height label is empty");
        self.correlation_period
            .validate()
            .context("Invalid correlation period")?;

        anyhow::ensure!(
            self.style.dpi > 0.0 && self.style.width > 0.0 && self.style.height > 0.0,
            "Figure size and dpi must be positive"
        );
        for key in DatasetKey::TIMESERIES {
            self.series_color(key)?;
        }
        anyhow::ensure!(
            self.output.file_name().is_some(),
            "Output path {:?} has no file name",
            self.output
        );
        Ok(())
    }
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in YAML content
/// Supports ${VAR} and ${VAR:-default} syntax
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut var_expr = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }
            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Resolve variable expression (supports VAR and VAR:-default syntax)
fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

// ============================================================================
// Tests
// ============================================================================
