//! Helpers over the native netcdf bindings.

use std::path::Path;
use std::sync::Once;

use netcdf::AttributeValue;

use crate::error::{NetCdfError, NetCdfResult};

/// Turn off HDF5's automatic error printing for the whole process.
///
/// Probing for an optional attribute makes HDF5 dump an `HDF5-DIAG` trace
/// to stderr even though the lookup failure is handled. Idempotent.
pub fn silence_hdf5_errors() {
    static SILENCED: Once = Once::new();
    SILENCED.call_once(|| {
        // SAFETY: a null handler and client data disable automatic
        // printing on the default error stack.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

pub fn open<P: AsRef<Path>>(path: P) -> NetCdfResult<netcdf::File> {
    silence_hdf5_errors();
    let path = path.as_ref();
    if !path.exists() {
        return Err(NetCdfError::NotFound(path.to_path_buf()));
    }
    netcdf::open(path).map_err(|source| NetCdfError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Attribute value, looked up by listing first so absent names never
/// reach the library.
fn attribute(var: &netcdf::Variable, name: &str) -> Option<AttributeValue> {
    var.attributes()
        .any(|attr| attr.name() == name)
        .then(|| var.attribute_value(name))
        .flatten()
        .and_then(Result::ok)
}

/// Numeric attribute widened to f64.
pub fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    f64::try_from(attribute(var, name)?).ok()
}

/// Text attribute; the first entry of a string array.
pub fn get_str_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    match attribute(var, name)? {
        AttributeValue::Str(s) => Some(s),
        AttributeValue::Strs(s) => s.into_iter().next(),
        _ => None,
    }
}

pub fn dimension_names(var: &netcdf::Variable) -> Vec<String> {
    var.dimensions().iter().map(|d| d.name()).collect()
}
