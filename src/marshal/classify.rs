//! Field classification: one record field → one engine application.
//!
//! There is no static schema for a record's fields, so each one is
//! disambiguated at run time, in order:
//!
//! 1. the model-library load list is skipped (handled before this pass)
//! 2. the name is canonicalized against the model's declared options
//! 3. textual values become string options
//! 4. single-element numerics become scalar options
//! 5. arrays declared MATRIX-kind are spooled to temp files
//! 6. everything else binds as voxel data, shape-checked against the extent
//!
//! Each classified field is applied to the engine immediately; there is no
//! staged commit. A later failure leaves the configuration partially
//! populated, which is acceptable because the whole run aborts.

use crate::domain::{NumArray, RunRecord, Value};
use crate::engine::{Engine, OptionKind, OptionSpec};
use crate::error::RunError;
use crate::marshal::bind::bind_voxel_data;
use crate::marshal::canon::canonical_option_name;
use crate::marshal::spool::spool_matrix_option;

/// The record field naming model libraries to load; consumed before this
/// pass runs.
pub const LOADMODELS_FIELD: &str = "loadmodels";

/// Classify and apply every record field to the engine.
pub fn apply_record(
    engine: &mut dyn Engine,
    record: &RunRecord,
    dims: &[usize; 4],
    model_options: &[OptionSpec],
) -> Result<(), RunError> {
    for (name, value) in record.iter() {
        if name == LOADMODELS_FIELD {
            continue;
        }
        let key = canonical_option_name(name, model_options);
        apply_field(engine, &key, value, dims, model_options)?;
    }
    Ok(())
}

fn apply_field(
    engine: &mut dyn Engine,
    key: &str,
    value: &Value,
    dims: &[usize; 4],
    model_options: &[OptionSpec],
) -> Result<(), RunError> {
    match value {
        Value::Str(s) => {
            engine.set_option(key, s)?;
        }
        Value::Scalar(v) => {
            engine.set_option(key, &format_scalar(*v))?;
        }
        Value::Array(array) => {
            if let Some(v) = array.scalar_value() {
                engine.set_option(key, &format_scalar(v))?;
            } else if array.len() == 1 {
                // Single-element but not floating: integer options are
                // rejected rather than coerced.
                return Err(RunError::classification(format!(
                    "option `{key}` is an {} scalar; use a real instead",
                    array.elem_name()
                )));
            } else if is_matrix_option(key, model_options) {
                spool_matrix_option(engine, key, array)?;
            } else {
                bind_voxel_data(engine, key, array, dims)?;
            }
        }
    }
    Ok(())
}

/// Shortest round-trip formatting, so option values survive re-parsing.
fn format_scalar(v: f64) -> String {
    format!("{v}")
}

/// Whether the model declares this option as MATRIX kind (NOT voxel data).
fn is_matrix_option(name: &str, model_options: &[OptionSpec]) -> bool {
    model_options
        .iter()
        .any(|opt| opt.name == name && opt.kind == OptionKind::Matrix)
}
