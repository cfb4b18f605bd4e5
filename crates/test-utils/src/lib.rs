//! Test support for the wind-compare workspace: scratch directories,
//! synthetic wind-speed grids, GeoJSON fixtures and zipped shapefile or
//! GeoPackage boundaries.
//!
//! Pulled in as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod archives;
pub mod fixtures;
pub mod generators;
pub mod paths;

pub use archives::*;
pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Assert that two numbers differ by at most `epsilon`.
///
/// Both sides are compared as `f64`, so `f32` grid values and `f64`
/// statistics mix freely. NaN never compares equal.
///
/// ```ignore
/// assert_approx_eq!(mean[0], 4.5, 1e-6);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "values not within {:e}: left = {:?}, right = {:?} (diff {:?})",
                epsilon, left, right, diff
            );
        }
    }};
}
