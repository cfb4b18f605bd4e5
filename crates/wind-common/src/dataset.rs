//! Dataset identities and per-dataset axis configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::WindError;

/// The three wind-speed arrays the comparison works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatasetKey {
    /// COSMO-REA2 on its native rotated-pole grid
    CosmoRea2,
    /// COSMO-REA2 regridded onto the NEWA grid
    CosmoRea2GriddedToNewa,
    /// New European Wind Atlas
    Newa,
}

impl DatasetKey {
    /// All keys, in figure column order.
    pub const ALL: [DatasetKey; 3] = [
        DatasetKey::CosmoRea2,
        DatasetKey::CosmoRea2GriddedToNewa,
        DatasetKey::Newa,
    ];

    /// Datasets that get a national annual time series.
    pub const TIMESERIES: [DatasetKey; 2] = [DatasetKey::CosmoRea2, DatasetKey::Newa];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKey::CosmoRea2 => "cosmo-rea2",
            DatasetKey::CosmoRea2GriddedToNewa => "cosmo-rea2-gridded-to-newa",
            DatasetKey::Newa => "newa",
        }
    }

    /// The dataset whose grid (axis names, polygons) this array lives on.
    pub fn grid_owner(&self) -> DatasetKey {
        match self {
            DatasetKey::CosmoRea2 => DatasetKey::CosmoRea2,
            DatasetKey::CosmoRea2GriddedToNewa | DatasetKey::Newa => DatasetKey::Newa,
        }
    }

    /// Whether this array is a regridded copy of another dataset.
    pub fn is_regridded(&self) -> bool {
        matches!(self, DatasetKey::CosmoRea2GriddedToNewa)
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKey {
    type Err = WindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatasetKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| WindError::UnknownDataset(s.to_string()))
    }
}

/// Axis names and display name of one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DatasetConfig {
    /// Name of the x dimension / coordinate (e.g. "rlon", "west_east")
    pub x_name: String,
    /// Name of the y dimension / coordinate (e.g. "rlat", "south_north")
    pub y_name: String,
    /// Name shown in captions and legends
    pub long_name: String,
    /// NetCDF variable holding wind speed; the single data variable when unset
    #[serde(default)]
    pub variable: Option<String>,
    /// Name of the time dimension
    #[serde(default = "default_time_name")]
    pub time_name: String,
}

fn default_time_name() -> String {
    "time".to_string()
}

impl DatasetConfig {
    pub fn new(x_name: &str, y_name: &str, long_name: &str) -> Self {
        Self {
            x_name: x_name.to_string(),
            y_name: y_name.to_string(),
            long_name: long_name.to_string(),
            variable: None,
            time_name: default_time_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_roundtrip() {
        for key in DatasetKey::ALL {
            assert_eq!(key.as_str().parse::<DatasetKey>().unwrap(), key);
        }
        assert!("era5".parse::<DatasetKey>().is_err());
    }

    #[test]
    fn test_grid_owner() {
        assert_eq!(DatasetKey::CosmoRea2GriddedToNewa.grid_owner(), DatasetKey::Newa);
        assert_eq!(DatasetKey::CosmoRea2.grid_owner(), DatasetKey::CosmoRea2);
    }

    #[test]
    fn test_config_kebab_case() {
        let json = r#"{"x-name": "west_east", "y-name": "south_north", "long-name": "NEWA"}"#;
        let config: DatasetConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.x_name, "west_east");
        assert_eq!(config.time_name, "time");
        assert!(config.variable.is_none());
    }
}
