//! Matrix spooling: 2D arrays → temporary ASCII matrix files.
//!
//! The engine accepts MATRIX-kind options only as file paths, so a host
//! matrix is written to a uniquely named temporary directory and the file's
//! path substituted as the option's string value. The directory is
//! deliberately persisted: the engine reads the file after marshalling
//! completes, and this layer performs no cleanup (lifetime is left to the
//! filesystem).
//!
//! Logical row/column order is preserved regardless of the host's storage
//! layout: row `i`, column `j` lands `i` lines down, `j` fields across.

use ndarray::Ix2;

use crate::domain::NumArray;
use crate::engine::Engine;
use crate::error::RunError;
use crate::io::matrix::write_ascii_matrix;

/// Write a MATRIX-kind option value to a temp file and register its path.
///
/// Only double-precision matrices are supported; single-precision and
/// integer matrices are rejected rather than coerced.
pub fn spool_matrix_option(
    engine: &mut dyn Engine,
    key: &str,
    array: &NumArray,
) -> Result<(), RunError> {
    if array.ndim() != 2 {
        return Err(RunError::validation(format!(
            "matrix option `{key}` must be 2-dimensional, got rank {}",
            array.ndim()
        )));
    }
    let Some(view) = array.as_f64() else {
        return Err(RunError::classification(format!(
            "matrix option `{key}` has {} elements; only double matrices are supported",
            array.elem_name()
        )));
    };
    let view = view
        .into_dimensionality::<Ix2>()
        .map_err(|e| RunError::validation(format!("matrix option `{key}`: {e}")))?;

    let dir = tempfile::Builder::new()
        .prefix("voxfit-")
        .tempdir()
        .map_err(|e| RunError::resource(format!("failed to create temp directory: {e}")))?;
    // Persist the directory: the engine reads the file later and this layer
    // does not clean up.
    let dir = dir.into_path();

    let path = dir.join(format!("{key}.mat"));
    write_ascii_matrix(&path, view)
        .map_err(|e| RunError::resource(format!("failed to write matrix option `{key}`: {e}")))?;

    engine.set_option(key, &path.to_string_lossy())?;
    Ok(())
}
