//! Marshalling: dynamic host inputs → strongly typed engine state.
//!
//! This is the hard part of the crate: the host supplies untyped records
//! and arrays with no static schema, and each field must be disambiguated
//! at run time — against the model's declared option descriptors where one
//! is named, by value shape otherwise — then applied to the engine in the
//! representation it expects.
//!
//! Everything here runs before the engine's `run`; every failure is
//! detected and surfaced without touching the fitting routine.

pub mod bind;
pub mod canon;
pub mod classify;
pub mod schema;
pub mod spool;

pub use bind::{bind_extent, bind_voxel_data, bind_voxel_f64, dims_match};
pub use canon::canonical_option_name;
pub use classify::apply_record;
pub use schema::resolve_model_options;
pub use spool::spool_matrix_option;

use ndarray::ArrayD;

use crate::error::RunError;

/// Check the three host inputs before anything else happens.
///
/// The main data must be a 4D real double array; the mask must be a 3D
/// boolean array whose dimensions match the first three of the main data.
/// Element types are enforced by the signature; rank and dimension
/// compatibility are checked here. Returns the main data's dimensions.
pub fn validate_input(data: &ArrayD<f64>, mask: &ArrayD<bool>) -> Result<[usize; 4], RunError> {
    if data.ndim() != 4 {
        return Err(RunError::validation(format!(
            "main data must be 4D, got rank {}",
            data.ndim()
        )));
    }
    let shape = data.shape();
    let dims = [shape[0], shape[1], shape[2], shape[3]];

    if mask.ndim() != 3 {
        return Err(RunError::validation(format!(
            "mask must be 3D, got rank {}",
            mask.ndim()
        )));
    }
    if !dims_match(mask.shape(), &dims) {
        return Err(RunError::validation(format!(
            "mask dimensions {:?} are not compatible with main data {:?}",
            mask.shape(),
            &dims[..3]
        )));
    }

    Ok(dims)
}
