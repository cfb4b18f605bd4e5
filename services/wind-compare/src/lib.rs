//! Wind-speed dataset comparison.
//!
//! Compares COSMO-REA2 and NEWA wind speeds over a region and draws one
//! composite figure: per-gridcell averages and correlation maps, plus the
//! regional annual average per dataset.

pub mod config;
pub mod pipeline;
pub mod plot;

pub use config::CompareConfig;
pub use pipeline::{compare, load_inputs, run, Comparison, Inputs};
