//! Extent and voxel-data binding.
//!
//! Host arrays follow the column-major / first-index-fastest convention.
//! `ndarray` tracks each array's actual storage layout, so the flatten
//! helpers here iterate in logical column-major index order — the engine
//! sees the same buffer whether the host shell stored its elements
//! Fortran- or C-contiguously.

use ndarray::{ArrayD, ArrayViewD};

use crate::domain::NumArray;
use crate::engine::Engine;
use crate::error::RunError;

/// Check an array's dimensions against the main data's.
///
/// Only as many dimensions are compared as the smaller of the array's rank
/// and 4, so a 3D array matches a 4D reference on the spatial dims alone.
pub fn dims_match(shape: &[usize], dims_4d: &[usize; 4]) -> bool {
    let ndims = shape.len().min(4);
    shape[..ndims] == dims_4d[..ndims]
}

/// Flatten an array into column-major element order, whatever its storage.
pub(crate) fn flatten_fortran<T: Copy>(view: ArrayViewD<'_, T>) -> Vec<T> {
    // Reversing the axes turns logical column-major order into the standard
    // iteration order.
    view.reversed_axes().iter().copied().collect()
}

/// Install the voxel extent and inclusion mask.
///
/// Must execute exactly once per run, before any voxel data is bound;
/// every subsequent array is dimension-checked against this extent.
pub fn bind_extent(
    engine: &mut dyn Engine,
    dims: &[usize; 4],
    mask: &ArrayD<bool>,
) -> Result<(), RunError> {
    let (nx, ny, nz) = (dims[0], dims[1], dims[2]);
    let len = nx * ny * nz;
    if mask.len() != len {
        return Err(RunError::validation(format!(
            "mask has {} elements but extent {nx}x{ny}x{nz} requires {len}",
            mask.len()
        )));
    }

    let flags: Vec<i32> = flatten_fortran(mask.view())
        .into_iter()
        .map(i32::from)
        .collect();
    engine.set_extent(nx, ny, nz, &flags)?;
    Ok(())
}

/// Bind a double-precision array as named voxel data.
///
/// The first three dimensions must equal the established extent; an
/// optional 4th dimension gives the per-voxel series length (1 when
/// absent). Values are narrowed to the engine's single-precision working
/// format.
pub fn bind_voxel_f64(
    engine: &mut dyn Engine,
    key: &str,
    view: ArrayViewD<'_, f64>,
    dims: &[usize; 4],
) -> Result<(), RunError> {
    if !dims_match(view.shape(), dims) {
        return Err(RunError::validation(format!(
            "dimensions {:?} of voxel data `{key}` are not compatible with main data {:?}",
            view.shape(),
            dims
        )));
    }
    if !(3..=4).contains(&view.ndim()) {
        return Err(RunError::validation(format!(
            "voxel data `{key}` must be 3D or 4D, got rank {}",
            view.ndim()
        )));
    }

    let points = if view.ndim() == 4 { view.shape()[3] } else { 1 };
    let flat: Vec<f32> = flatten_fortran(view).into_iter().map(|v| v as f32).collect();
    engine.set_voxel_data(key, points, &flat)?;
    Ok(())
}

/// Bind a host numeric array as named voxel data, rejecting non-double
/// element types.
pub fn bind_voxel_data(
    engine: &mut dyn Engine,
    key: &str,
    array: &NumArray,
    dims: &[usize; 4],
) -> Result<(), RunError> {
    let Some(view) = array.as_f64() else {
        return Err(RunError::validation(format!(
            "voxel data `{key}` must be type double, got {}",
            array.elem_name()
        )));
    };
    bind_voxel_f64(engine, key, view, dims)
}
